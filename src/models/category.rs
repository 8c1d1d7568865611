use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// 商品品类 (product_categories)
///
/// `price_per_piece` 是当前价格; 订单明细和退货行各自保存下单时的价格快照,
/// 改价不会影响历史记录。
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ProductCategory {
    pub id: Uuid,
    pub name: String,
    pub price_per_piece: BigDecimal,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub price_per_piece: BigDecimal,
    #[serde(default = "super::seller::default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub price_per_piece: Option<BigDecimal>,
    pub is_active: Option<bool>,
}
