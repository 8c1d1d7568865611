use crate::error::{BillingError, BillingResult};
use crate::models::{
    CategoryUpdate, CompanySettings, NewCategory, NewSeller, ProductCategory, Seller,
    SellerUpdate, SettingsUpdate,
};
use crate::db::queries;
use sqlx::PgPool;
use uuid::Uuid;

/// 名称去首尾空白后不能为空
fn required_name<'a>(entity: &str, name: &'a str) -> BillingResult<&'a str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(BillingError::Validation(format!("{} name is required", entity)));
    }
    Ok(trimmed)
}

/// 部分更新时的名称: 未提供则保持原值, 提供了就按新建时的规则校验
fn optional_name<'a>(entity: &str, name: Option<&'a str>) -> BillingResult<Option<&'a str>> {
    name.map(|n| required_name(entity, n)).transpose()
}

/// 新建供货商
pub async fn create_seller(pool: &PgPool, seller: &NewSeller) -> BillingResult<Seller> {
    let name = required_name("seller", &seller.name)?;

    let created = sqlx::query_as::<_, Seller>(
        r#"
        INSERT INTO sellers (id, name, contact, gst_number, payment_notes, is_active)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, name, contact, gst_number, payment_notes, is_active, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(&seller.contact)
    .bind(&seller.gst_number)
    .bind(&seller.payment_notes)
    .bind(seller.is_active)
    .fetch_one(pool)
    .await?;

    tracing::info!("Seller {} ({}) created", created.name, created.id);
    Ok(created)
}

/// 更新供货商, 未提供的字段保持原值
pub async fn update_seller(
    pool: &PgPool,
    seller_id: Uuid,
    update: &SellerUpdate,
) -> BillingResult<Seller> {
    let name = optional_name("seller", update.name.as_deref())?;

    sqlx::query_as::<_, Seller>(
        r#"
        UPDATE sellers
        SET name = COALESCE($2, name),
            contact = COALESCE($3, contact),
            gst_number = COALESCE($4, gst_number),
            payment_notes = COALESCE($5, payment_notes),
            is_active = COALESCE($6, is_active)
        WHERE id = $1
        RETURNING id, name, contact, gst_number, payment_notes, is_active, created_at
        "#,
    )
    .bind(seller_id)
    .bind(name)
    .bind(&update.contact)
    .bind(&update.gst_number)
    .bind(&update.payment_notes)
    .bind(update.is_active)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| BillingError::not_found("seller", seller_id))
}

pub async fn delete_seller(pool: &PgPool, seller_id: Uuid) -> BillingResult<()> {
    let result = sqlx::query("DELETE FROM sellers WHERE id = $1")
        .bind(seller_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(BillingError::not_found("seller", seller_id));
    }
    tracing::info!("Seller {} deleted", seller_id);
    Ok(())
}

fn validate_price(price: &bigdecimal::BigDecimal) -> BillingResult<()> {
    if *price < bigdecimal::BigDecimal::from(0) {
        return Err(BillingError::Validation(format!(
            "price per piece must not be negative, got {}",
            price
        )));
    }
    Ok(())
}

/// 新建品类
pub async fn create_category(
    pool: &PgPool,
    category: &NewCategory,
) -> BillingResult<ProductCategory> {
    let name = required_name("category", &category.name)?;
    validate_price(&category.price_per_piece)?;

    let created = sqlx::query_as::<_, ProductCategory>(
        r#"
        INSERT INTO product_categories (id, name, price_per_piece, is_active)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, price_per_piece, is_active
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(&category.price_per_piece)
    .bind(category.is_active)
    .fetch_one(pool)
    .await?;

    tracing::info!(
        "Category {} created at {}/piece",
        created.name,
        created.price_per_piece
    );
    Ok(created)
}

/// 更新品类; 改价只影响之后的订单和退货
pub async fn update_category(
    pool: &PgPool,
    category_id: Uuid,
    update: &CategoryUpdate,
) -> BillingResult<ProductCategory> {
    let name = optional_name("category", update.name.as_deref())?;
    if let Some(price) = &update.price_per_piece {
        validate_price(price)?;
    }

    sqlx::query_as::<_, ProductCategory>(
        r#"
        UPDATE product_categories
        SET name = COALESCE($2, name),
            price_per_piece = COALESCE($3, price_per_piece),
            is_active = COALESCE($4, is_active)
        WHERE id = $1
        RETURNING id, name, price_per_piece, is_active
        "#,
    )
    .bind(category_id)
    .bind(name)
    .bind(&update.price_per_piece)
    .bind(update.is_active)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| BillingError::not_found("category", category_id))
}

pub async fn delete_category(pool: &PgPool, category_id: Uuid) -> BillingResult<()> {
    let result = sqlx::query("DELETE FROM product_categories WHERE id = $1")
        .bind(category_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(BillingError::not_found("category", category_id));
    }
    tracing::info!("Category {} deleted", category_id);
    Ok(())
}

/// 保存公司设置: 已有则更新, 否则插入
pub async fn upsert_company_settings(
    pool: &PgPool,
    settings: &SettingsUpdate,
) -> BillingResult<CompanySettings> {
    if settings.company_name.trim().is_empty() {
        return Err(BillingError::Validation("company name is required".to_string()));
    }

    let existing = queries::get_company_settings(pool).await?;
    let saved = match existing {
        Some(current) => {
            sqlx::query_as::<_, CompanySettings>(
                r#"
                UPDATE company_settings
                SET company_name = $2, gst_number = $3, currency_symbol = $4
                WHERE id = $1
                RETURNING id, company_name, gst_number, currency_symbol
                "#,
            )
            .bind(current.id)
            .bind(settings.company_name.trim())
            .bind(&settings.gst_number)
            .bind(&settings.currency_symbol)
            .fetch_one(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, CompanySettings>(
                r#"
                INSERT INTO company_settings (id, company_name, gst_number, currency_symbol)
                VALUES ($1, $2, $3, $4)
                RETURNING id, company_name, gst_number, currency_symbol
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(settings.company_name.trim())
            .bind(&settings.gst_number)
            .bind(&settings.currency_symbol)
            .fetch_one(pool)
            .await?
        }
    };

    tracing::info!("Company settings saved for {}", saved.company_name);
    Ok(saved)
}
