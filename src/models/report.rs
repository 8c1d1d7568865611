use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::Serialize;

/// 月度报表文档模型 (交给外部渲染器出 PDF)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub company_name: String,
    pub tax_id: Option<String>,
    pub currency_symbol: String,
    pub period_label: String,
    pub seller_label: String,
    pub total_orders: usize,
    pub rows: Vec<ReportRow>,
    pub totals: ReportTotals,
    pub returns: Option<ReturnsBlock>, // 仅在退货总额 > 0 时出现
    pub gross_amount: BigDecimal,
    pub net_payable: BigDecimal,
    pub generated_on: NaiveDate,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub name: String,
    pub unit_price: BigDecimal,
    pub quantity: i64,
    pub subtotal: BigDecimal,
}

/// 表尾合计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTotals {
    pub quantity: i64,
    pub subtotal: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnsBlock {
    pub quantity: i64,
    pub amount: BigDecimal,
}
