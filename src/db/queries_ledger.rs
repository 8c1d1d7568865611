use crate::db::queries;
use crate::error::{BillingError, BillingResult};
use crate::models::{NewOrder, NewReturn, OrderItem, OrderWithItems, PricedItem, Return};
use crate::service::pricing::{price_order_items, price_return_line, snapshot_prices};
use bigdecimal::BigDecimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// 为订单定价; 已有明细的品类沿用快照价, 只为其余品类查询当前价格
async fn price_order(
    pool: &PgPool,
    order: &NewOrder,
    existing: &[OrderItem],
) -> BillingResult<(Vec<PricedItem>, BigDecimal)> {
    let snapshots = snapshot_prices(existing);
    let mut category_ids: Vec<Uuid> = order
        .items
        .iter()
        .map(|i| i.category_id)
        .filter(|id| !snapshots.contains_key(id))
        .collect();
    category_ids.sort_unstable();
    category_ids.dedup();

    let categories = if category_ids.is_empty() {
        Vec::new()
    } else {
        queries::categories_by_ids(pool, &category_ids).await?
    };
    price_order_items(&order.items, existing, &categories)
}

/// 批量插入订单明细
async fn insert_items(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    items: &[PricedItem],
) -> Result<(), sqlx::Error> {
    let mut query_builder: sqlx::QueryBuilder<Postgres> = sqlx::QueryBuilder::new(
        "INSERT INTO order_items (id, order_id, category_id, quantity, price_per_piece, subtotal) ",
    );
    query_builder.push_values(items, |mut b, item| {
        b.push_bind(Uuid::new_v4())
            .push_bind(order_id)
            .push_bind(item.category_id)
            .push_bind(item.quantity)
            .push_bind(item.price_per_piece.clone())
            .push_bind(item.subtotal.clone());
    });
    query_builder.build().execute(&mut **tx).await?;
    Ok(())
}

/// 新建订单及明细 (同一事务)
pub async fn create_order(pool: &PgPool, order: &NewOrder) -> BillingResult<OrderWithItems> {
    let (items, total) = price_order(pool, order, &[]).await?;
    let order_id = Uuid::new_v4();

    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        INSERT INTO orders (id, order_date, seller_id, notes, total_amount)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(order_id)
    .bind(order.order_date)
    .bind(order.seller_id)
    .bind(&order.notes)
    .bind(&total)
    .execute(&mut *tx)
    .await?;
    insert_items(&mut tx, order_id, &items).await?;
    tx.commit().await?;

    tracing::info!(
        "Order {} created: {} items, total {}",
        order_id,
        items.len(),
        total
    );
    queries::get_order_with_items(pool, order_id)
        .await?
        .ok_or_else(|| BillingError::not_found("order", order_id))
}

/// 更新订单: 改主表并整体替换明细, 未换品类的行保留原快照价
pub async fn update_order(
    pool: &PgPool,
    order_id: Uuid,
    order: &NewOrder,
) -> BillingResult<OrderWithItems> {
    let current = queries::get_order_with_items(pool, order_id)
        .await?
        .ok_or_else(|| BillingError::not_found("order", order_id))?;
    let (items, total) = price_order(pool, order, &current.items).await?;

    let mut tx = pool.begin().await?;
    let updated = sqlx::query(
        r#"
        UPDATE orders
        SET order_date = $2, seller_id = $3, notes = $4, total_amount = $5
        WHERE id = $1
        "#,
    )
    .bind(order_id)
    .bind(order.order_date)
    .bind(order.seller_id)
    .bind(&order.notes)
    .bind(&total)
    .execute(&mut *tx)
    .await?;
    if updated.rows_affected() == 0 {
        return Err(BillingError::not_found("order", order_id));
    }

    sqlx::query("DELETE FROM order_items WHERE order_id = $1")
        .bind(order_id)
        .execute(&mut *tx)
        .await?;
    insert_items(&mut tx, order_id, &items).await?;
    tx.commit().await?;

    tracing::info!("Order {} updated: {} items, total {}", order_id, items.len(), total);
    queries::get_order_with_items(pool, order_id)
        .await?
        .ok_or_else(|| BillingError::not_found("order", order_id))
}

/// 删除订单 (明细一并删除)
pub async fn delete_order(pool: &PgPool, order_id: Uuid) -> BillingResult<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM order_items WHERE order_id = $1")
        .bind(order_id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(order_id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(BillingError::not_found("order", order_id));
    }
    tx.commit().await?;

    tracing::info!("Order {} deleted", order_id);
    Ok(())
}

/// 计算退货扣款; 编辑且品类未变时沿用原单价
async fn price_return(
    pool: &PgPool,
    ret: &NewReturn,
    previous: Option<&Return>,
) -> BillingResult<(BigDecimal, BigDecimal)> {
    let keeps_price = previous.is_some_and(|p| p.category_id == Some(ret.category_id));
    let categories = if keeps_price {
        Vec::new()
    } else {
        queries::categories_by_ids(pool, &[ret.category_id]).await?
    };
    price_return_line(ret, previous, categories.first())
}

/// 新建退货
pub async fn create_return(pool: &PgPool, ret: &NewReturn) -> BillingResult<Return> {
    let (price_per_unit, total_deduction) = price_return(pool, ret, None).await?;
    let return_id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO returns (id, return_date, seller_id, category_id, quantity,
                             price_per_unit, total_deduction, reason)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(return_id)
    .bind(ret.return_date)
    .bind(ret.seller_id)
    .bind(ret.category_id)
    .bind(ret.quantity)
    .bind(&price_per_unit)
    .bind(&total_deduction)
    .bind(&ret.reason)
    .execute(pool)
    .await?;

    tracing::info!("Return {} created: deduction {}", return_id, total_deduction);
    queries::get_return(pool, return_id)
        .await?
        .ok_or_else(|| BillingError::not_found("return", return_id))
}

/// 更新退货; 换了品类才按当前价格重新计算扣款
pub async fn update_return(pool: &PgPool, return_id: Uuid, ret: &NewReturn) -> BillingResult<Return> {
    let previous = queries::get_return(pool, return_id)
        .await?
        .ok_or_else(|| BillingError::not_found("return", return_id))?;
    let (price_per_unit, total_deduction) = price_return(pool, ret, Some(&previous)).await?;

    let result = sqlx::query(
        r#"
        UPDATE returns
        SET return_date = $2, seller_id = $3, category_id = $4, quantity = $5,
            price_per_unit = $6, total_deduction = $7, reason = $8
        WHERE id = $1
        "#,
    )
    .bind(return_id)
    .bind(ret.return_date)
    .bind(ret.seller_id)
    .bind(ret.category_id)
    .bind(ret.quantity)
    .bind(&price_per_unit)
    .bind(&total_deduction)
    .bind(&ret.reason)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(BillingError::not_found("return", return_id));
    }

    tracing::info!("Return {} updated: deduction {}", return_id, total_deduction);
    queries::get_return(pool, return_id)
        .await?
        .ok_or_else(|| BillingError::not_found("return", return_id))
}

pub async fn delete_return(pool: &PgPool, return_id: Uuid) -> BillingResult<()> {
    let result = sqlx::query("DELETE FROM returns WHERE id = $1")
        .bind(return_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(BillingError::not_found("return", return_id));
    }
    tracing::info!("Return {} deleted", return_id);
    Ok(())
}
