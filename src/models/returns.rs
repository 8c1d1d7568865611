use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// 退货记录 (returns), 带关联的供货商/品类名称
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Return {
    pub id: Uuid,
    pub return_date: NaiveDate,
    pub seller_id: Option<Uuid>,
    pub seller_name: Option<String>,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub quantity: i32,
    pub price_per_unit: BigDecimal, // 退货时的价格快照
    pub total_deduction: BigDecimal, // = quantity × price_per_unit
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReturn {
    pub return_date: NaiveDate,
    pub seller_id: Uuid,
    pub category_id: Uuid,
    pub quantity: i32,
    pub reason: Option<String>,
}
