use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 汇总引擎的输出, 一个时间窗口 + 供货商过滤条件下的全部统计
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregation {
    pub order_count: usize,
    pub total_pieces: i64,
    pub gross_amount: BigDecimal,
    pub total_returns: BigDecimal,
    pub total_return_qty: i64,
    pub net_payable: BigDecimal, // 可为负数
    pub category_breakdown: Vec<CategoryBreakdown>,
    pub suppliers: Vec<SupplierTotals>,
    pub top_seller: Option<TopSeller>,
    pub orders_over_time: Vec<TimePoint>,
}

/// 品类明细
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub category_id: Option<Uuid>,
    pub name: String,
    pub price_per_piece: BigDecimal,
    pub quantity: i64,
    pub subtotal: BigDecimal,
}

/// 每个供货商的收入与退货扣款
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierTotals {
    pub seller_id: Option<Uuid>,
    pub seller: String,
    pub revenue: BigDecimal,
    pub returns: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopSeller {
    pub name: String,
    pub amount: BigDecimal,
}

/// 按订单日期聚合的时间序列点, 只包含有订单的日期
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimePoint {
    pub date: NaiveDate,
    pub label: String, // "Jan 5"
    pub orders: usize,
    pub amount: BigDecimal,
}

/// 仪表盘卡片
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub todays_orders: usize,
    pub monthly_pieces: i64,
    pub monthly_payable: BigDecimal,
    pub top_seller: Option<TopSeller>,
    pub total_monthly_amount: BigDecimal,
    pub total_returns: BigDecimal,
}

impl DashboardStats {
    pub fn from_aggregation(agg: &Aggregation, todays_orders: usize) -> Self {
        Self {
            todays_orders,
            monthly_pieces: agg.total_pieces,
            monthly_payable: agg.net_payable.clone(),
            top_seller: agg.top_seller.clone(),
            total_monthly_amount: agg.gross_amount.clone(),
            total_returns: agg.total_returns.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPieces {
    pub category: String,
    pub pieces: i64,
    pub fill: usize, // 调色板槽位 1..=6
}

/// 图表数据
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub orders_over_time: Vec<TimePoint>,
    pub pieces_by_category: Vec<CategoryPieces>,
    pub revenue_by_supplier: Vec<SupplierTotals>,
}

impl From<Aggregation> for ChartData {
    fn from(agg: Aggregation) -> Self {
        let pieces_by_category = agg
            .category_breakdown
            .into_iter()
            .enumerate()
            .map(|(idx, c)| CategoryPieces {
                category: c.name,
                pieces: c.quantity,
                fill: idx % 6 + 1,
            })
            .collect();

        Self {
            orders_over_time: agg.orders_over_time,
            pieces_by_category,
            revenue_by_supplier: agg.suppliers,
        }
    }
}
