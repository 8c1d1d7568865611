use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// 公司设置 (每账户一行), 仅用于报表抬头
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CompanySettings {
    pub id: Uuid,
    pub company_name: String,
    pub gst_number: Option<String>,
    pub currency_symbol: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettingsUpdate {
    pub company_name: String,
    pub gst_number: Option<String>,
    pub currency_symbol: String,
}
