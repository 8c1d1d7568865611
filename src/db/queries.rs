use crate::models::{
    CompanySettings, DateRange, Order, OrderItem, OrderWithItems, ProductCategory, Return, Seller,
};
use sqlx::PgPool;
use uuid::Uuid;

/// 查询全部供货商 (按名称)
pub async fn list_sellers(pool: &PgPool) -> Result<Vec<Seller>, sqlx::Error> {
    sqlx::query_as::<_, Seller>(
        r#"
        SELECT id, name, contact, gst_number, payment_notes, is_active, created_at
        FROM sellers
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await
}

/// 查询全部品类 (按名称)
pub async fn list_categories(pool: &PgPool) -> Result<Vec<ProductCategory>, sqlx::Error> {
    sqlx::query_as::<_, ProductCategory>(
        r#"
        SELECT id, name, price_per_piece, is_active
        FROM product_categories
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await
}

/// 按ID批量查询品类 (定价用)
pub async fn categories_by_ids(
    pool: &PgPool,
    category_ids: &[Uuid],
) -> Result<Vec<ProductCategory>, sqlx::Error> {
    sqlx::query_as::<_, ProductCategory>(
        r#"
        SELECT id, name, price_per_piece, is_active
        FROM product_categories
        WHERE id = ANY($1)
        "#,
    )
    .bind(category_ids)
    .fetch_all(pool)
    .await
}

/// 查询时间窗口内的订单, 可按供货商过滤 (按订单日期升序)
pub async fn list_orders(
    pool: &PgPool,
    range: DateRange,
    seller_id: Option<Uuid>,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as::<_, Order>(
        r#"
        SELECT o.id, o.order_date, o.seller_id, s.name AS seller_name,
               o.notes, o.total_amount, o.created_at
        FROM orders o
        LEFT JOIN sellers s ON s.id = o.seller_id
        WHERE o.order_date BETWEEN $1 AND $2
          AND ($3::uuid IS NULL OR o.seller_id = $3)
        ORDER BY o.order_date, o.created_at
        "#,
    )
    .bind(range.from)
    .bind(range.to)
    .bind(seller_id)
    .fetch_all(pool)
    .await?;

    tracing::debug!(
        "Fetched {} orders for {}..{} (seller: {:?})",
        orders.len(),
        range.from,
        range.to,
        seller_id
    );
    Ok(orders)
}

/// 查询全部订单 (最新在前), 用于订单列表页
pub async fn list_all_orders(pool: &PgPool) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(
        r#"
        SELECT o.id, o.order_date, o.seller_id, s.name AS seller_name,
               o.notes, o.total_amount, o.created_at
        FROM orders o
        LEFT JOIN sellers s ON s.id = o.seller_id
        ORDER BY o.order_date DESC, o.created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

/// 查询单个订单及其明细
pub async fn get_order_with_items(
    pool: &PgPool,
    order_id: Uuid,
) -> Result<Option<OrderWithItems>, sqlx::Error> {
    let order = sqlx::query_as::<_, Order>(
        r#"
        SELECT o.id, o.order_date, o.seller_id, s.name AS seller_name,
               o.notes, o.total_amount, o.created_at
        FROM orders o
        LEFT JOIN sellers s ON s.id = o.seller_id
        WHERE o.id = $1
        "#,
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?;

    let Some(order) = order else {
        return Ok(None);
    };

    let items = list_order_items(pool, &[order_id]).await?;
    Ok(Some(OrderWithItems { order, items }))
}

/// 按订单ID批量查询明细, 带品类名称
pub async fn list_order_items(
    pool: &PgPool,
    order_ids: &[Uuid],
) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as::<_, OrderItem>(
        r#"
        SELECT oi.id, oi.order_id, oi.category_id, c.name AS category_name,
               oi.quantity, oi.price_per_piece, oi.subtotal
        FROM order_items oi
        LEFT JOIN product_categories c ON c.id = oi.category_id
        WHERE oi.order_id = ANY($1)
        ORDER BY oi.order_id
        "#,
    )
    .bind(order_ids)
    .fetch_all(pool)
    .await?;

    tracing::debug!("Fetched {} items for {} orders", items.len(), order_ids.len());
    Ok(items)
}

/// 查询时间窗口内的退货, 可按供货商过滤
pub async fn list_returns(
    pool: &PgPool,
    range: DateRange,
    seller_id: Option<Uuid>,
) -> Result<Vec<Return>, sqlx::Error> {
    let returns = sqlx::query_as::<_, Return>(
        r#"
        SELECT r.id, r.return_date, r.seller_id, s.name AS seller_name,
               r.category_id, c.name AS category_name,
               r.quantity, r.price_per_unit, r.total_deduction, r.reason, r.created_at
        FROM returns r
        LEFT JOIN sellers s ON s.id = r.seller_id
        LEFT JOIN product_categories c ON c.id = r.category_id
        WHERE r.return_date BETWEEN $1 AND $2
          AND ($3::uuid IS NULL OR r.seller_id = $3)
        ORDER BY r.return_date, r.created_at
        "#,
    )
    .bind(range.from)
    .bind(range.to)
    .bind(seller_id)
    .fetch_all(pool)
    .await?;

    tracing::debug!(
        "Fetched {} returns for {}..{} (seller: {:?})",
        returns.len(),
        range.from,
        range.to,
        seller_id
    );
    Ok(returns)
}

/// 查询全部退货 (最新在前)
pub async fn list_all_returns(pool: &PgPool) -> Result<Vec<Return>, sqlx::Error> {
    sqlx::query_as::<_, Return>(
        r#"
        SELECT r.id, r.return_date, r.seller_id, s.name AS seller_name,
               r.category_id, c.name AS category_name,
               r.quantity, r.price_per_unit, r.total_deduction, r.reason, r.created_at
        FROM returns r
        LEFT JOIN sellers s ON s.id = r.seller_id
        LEFT JOIN product_categories c ON c.id = r.category_id
        ORDER BY r.return_date DESC, r.created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

/// 查询单条退货
pub async fn get_return(pool: &PgPool, return_id: Uuid) -> Result<Option<Return>, sqlx::Error> {
    sqlx::query_as::<_, Return>(
        r#"
        SELECT r.id, r.return_date, r.seller_id, s.name AS seller_name,
               r.category_id, c.name AS category_name,
               r.quantity, r.price_per_unit, r.total_deduction, r.reason, r.created_at
        FROM returns r
        LEFT JOIN sellers s ON s.id = r.seller_id
        LEFT JOIN product_categories c ON c.id = r.category_id
        WHERE r.id = $1
        "#,
    )
    .bind(return_id)
    .fetch_optional(pool)
    .await
}

/// 查询公司设置 (最多一行)
pub async fn get_company_settings(pool: &PgPool) -> Result<Option<CompanySettings>, sqlx::Error> {
    sqlx::query_as::<_, CompanySettings>(
        r#"
        SELECT id, company_name, gst_number, currency_symbol
        FROM company_settings
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await
}
