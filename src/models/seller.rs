use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// 供货商 (sellers)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Seller {
    pub id: Uuid,
    pub name: String,
    pub contact: Option<String>,
    pub gst_number: Option<String>,
    pub payment_notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSeller {
    pub name: String,
    pub contact: Option<String>,
    pub gst_number: Option<String>,
    pub payment_notes: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// 部分更新, 缺省字段保持原值
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SellerUpdate {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub gst_number: Option<String>,
    pub payment_notes: Option<String>,
    pub is_active: Option<bool>,
}

pub(crate) fn default_active() -> bool {
    true
}
