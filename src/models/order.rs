use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// 订单主表 (orders), 带关联的供货商名称
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_date: NaiveDate,
    pub seller_id: Option<Uuid>,
    pub seller_name: Option<String>, // LEFT JOIN, 供货商已删除时为空
    pub notes: Option<String>,
    pub total_amount: BigDecimal, // = Σ 明细小计
    pub created_at: DateTime<Utc>,
}

/// 订单明细 (order_items), 带关联的品类名称
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub quantity: i32,
    pub price_per_piece: BigDecimal, // 下单时的价格快照
    pub subtotal: BigDecimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// 新建/更新订单请求; 单价和金额由服务端按品类当前价格计算
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    pub order_date: NaiveDate,
    pub seller_id: Uuid,
    pub notes: Option<String>,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderItem {
    pub category_id: Uuid,
    pub quantity: i32,
}

/// 已定价的明细行, 待写入 order_items
#[derive(Debug, Clone, PartialEq)]
pub struct PricedItem {
    pub category_id: Uuid,
    pub quantity: i32,
    pub price_per_piece: BigDecimal,
    pub subtotal: BigDecimal,
}
