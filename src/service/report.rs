use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;

use crate::config::ReportConfig;
use crate::error::{BillingError, BillingResult};
use crate::models::{
    Aggregation, CompanySettings, Order, OrderItem, ReportDocument, ReportRow, ReportTotals,
    Return, ReturnsBlock,
};
use crate::service::aggregator::aggregate;

pub const ALL_SELLERS_LABEL: &str = "All Sellers";
pub const REPORT_TITLE: &str = "Monthly Billing Report";

/// 报表标签: 周期 ("January 2025") 与供货商名
#[derive(Debug, Clone)]
pub struct ReportLabels {
    pub period_label: String,
    pub seller_label: String,
    pub generated_on: NaiveDate,
}

/// 报表构建器, 持有公司设置缺失时的兜底抬头
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    defaults: ReportConfig,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new(crate::config::AppConfig::default().report)
    }
}

impl ReportBuilder {
    pub fn new(defaults: ReportConfig) -> Self {
        Self { defaults }
    }

    pub fn build(
        &self,
        orders: &[Order],
        returns: &[Return],
        items: &[OrderItem],
        settings: Option<&CompanySettings>,
        labels: &ReportLabels,
    ) -> BillingResult<ReportDocument> {
        let agg = aggregate(orders, items, returns);
        self.from_aggregation(&agg, settings, labels)
    }

    /// 由汇总结果生成文档模型, 并校验明细合计 == 毛收入
    pub fn from_aggregation(
        &self,
        agg: &Aggregation,
        settings: Option<&CompanySettings>,
        labels: &ReportLabels,
    ) -> BillingResult<ReportDocument> {
        let rows: Vec<ReportRow> = agg
            .category_breakdown
            .iter()
            .map(|c| ReportRow {
                name: c.name.clone(),
                unit_price: c.price_per_piece.clone(),
                quantity: c.quantity,
                subtotal: c.subtotal.clone(),
            })
            .collect();

        let totals = ReportTotals {
            quantity: rows.iter().map(|r| r.quantity).sum(),
            subtotal: rows
                .iter()
                .fold(BigDecimal::zero(), |acc, r| acc + &r.subtotal),
        };

        // 允许最小货币单位 (0.01) 的误差
        let tolerance = BigDecimal::from(1) / BigDecimal::from(100);
        if (&totals.subtotal - &agg.gross_amount).abs() > tolerance {
            tracing::warn!(
                "Report cross-check failed for {} / {}: breakdown={}, gross={}",
                labels.seller_label,
                labels.period_label,
                totals.subtotal,
                agg.gross_amount
            );
            return Err(BillingError::ReportMismatch {
                breakdown: totals.subtotal,
                gross: agg.gross_amount.clone(),
            });
        }

        let returns = (agg.total_returns > BigDecimal::zero()).then(|| ReturnsBlock {
            quantity: agg.total_return_qty,
            amount: agg.total_returns.clone(),
        });

        let company_name = settings
            .map(|s| s.company_name.trim())
            .filter(|n| !n.is_empty())
            .unwrap_or(self.defaults.default_company_name.as_str())
            .to_string();
        let currency_symbol = settings
            .map(|s| s.currency_symbol.trim())
            .filter(|c| !c.is_empty())
            .unwrap_or(self.defaults.default_currency_symbol.as_str())
            .to_string();
        let tax_id = settings
            .and_then(|s| s.gst_number.clone())
            .filter(|g| !g.trim().is_empty());

        let file_name = format!(
            "{}_{}_{}.pdf",
            company_name,
            labels.seller_label,
            labels.period_label.replace(' ', "_")
        );

        Ok(ReportDocument {
            title: REPORT_TITLE.to_string(),
            company_name,
            tax_id,
            currency_symbol,
            period_label: labels.period_label.clone(),
            seller_label: labels.seller_label.clone(),
            total_orders: agg.order_count,
            rows,
            totals,
            returns,
            gross_amount: agg.gross_amount.clone(),
            net_payable: agg.net_payable.clone(),
            generated_on: labels.generated_on,
            file_name,
        })
    }
}

/// 以默认抬头构建报表
pub fn build_report(
    orders: &[Order],
    returns: &[Return],
    items: &[OrderItem],
    settings: Option<&CompanySettings>,
    period_label: &str,
    seller_label: Option<&str>,
) -> BillingResult<ReportDocument> {
    let labels = ReportLabels {
        period_label: period_label.to_string(),
        seller_label: seller_label.unwrap_or(ALL_SELLERS_LABEL).to_string(),
        generated_on: chrono::Local::now().date_naive(),
    };
    ReportBuilder::default().build(orders, returns, items, settings, &labels)
}

impl ReportDocument {
    /// 导出为 CSV: 表头、品类明细、合计、退货 (如有)、应付净额
    pub fn to_csv(&self) -> BillingResult<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());

        writer.write_record([self.title.as_str(), self.company_name.as_str()])?;
        if let Some(tax_id) = &self.tax_id {
            writer.write_record(["GST", tax_id.as_str()])?;
        }
        writer.write_record(["Period", self.period_label.as_str()])?;
        writer.write_record(["Seller", self.seller_label.as_str()])?;
        writer.write_record(["Currency", self.currency_symbol.as_str()])?;

        writer.write_record(["Category", "Price/Piece", "Quantity", "Subtotal"])?;
        for row in &self.rows {
            writer.write_record([
                row.name.clone(),
                row.unit_price.to_string(),
                row.quantity.to_string(),
                row.subtotal.to_string(),
            ])?;
        }
        writer.write_record([
            "Total".to_string(),
            String::new(),
            self.totals.quantity.to_string(),
            self.totals.subtotal.to_string(),
        ])?;

        if let Some(returns) = &self.returns {
            writer.write_record([
                "Returns / Deductions".to_string(),
                String::new(),
                returns.quantity.to_string(),
                format!("-{}", returns.amount),
            ])?;
        }
        writer.write_record([
            "Net Payable Amount".to_string(),
            String::new(),
            String::new(),
            self.net_payable.to_string(),
        ])?;

        writer
            .into_inner()
            .map_err(|e| BillingError::Export(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::aggregator::fixtures::*;
    use uuid::Uuid;

    const A: (u128, &str) = (1, "A");

    fn labels() -> ReportLabels {
        ReportLabels {
            period_label: "January 2025".to_string(),
            seller_label: ALL_SELLERS_LABEL.to_string(),
            generated_on: date(2025, 2, 1),
        }
    }

    fn settings() -> CompanySettings {
        CompanySettings {
            id: Uuid::from_u128(1),
            company_name: "Stitch Works".to_string(),
            gst_number: Some("29ABCDE1234F1Z5".to_string()),
            currency_symbol: "₹".to_string(),
        }
    }

    #[test]
    fn totals_match_gross_and_returns_block_is_shown() {
        let orders = vec![order(1, Some(A), date(2025, 1, 5), 24500)];
        let items = vec![item(1, (1, "Hoodie"), 50, 230), item(1, (2, "Shirt"), 100, 130)];
        let returns = vec![ret(A, date(2025, 1, 9), 5, 230)];

        let doc = ReportBuilder::default()
            .build(&orders, &returns, &items, Some(&settings()), &labels())
            .unwrap();

        assert_eq!(doc.company_name, "Stitch Works");
        assert_eq!(doc.tax_id.as_deref(), Some("29ABCDE1234F1Z5"));
        assert_eq!(doc.rows.len(), 2);
        assert_eq!(doc.totals.quantity, 150);
        assert_eq!(doc.totals.subtotal, doc.gross_amount);
        assert_eq!(
            doc.returns,
            Some(ReturnsBlock {
                quantity: 5,
                amount: BigDecimal::from(1150)
            })
        );
        assert_eq!(doc.net_payable, BigDecimal::from(23350));
        assert_eq!(doc.file_name, "Stitch Works_All Sellers_January_2025.pdf");
    }

    #[test]
    fn no_returns_hides_block() {
        let orders = vec![order(1, Some(A), date(2025, 1, 5), 2300)];
        let items = vec![item(1, (1, "Hoodie"), 10, 230)];

        let doc = ReportBuilder::default()
            .build(&orders, &[], &items, Some(&settings()), &labels())
            .unwrap();
        assert!(doc.returns.is_none());
        assert_eq!(doc.net_payable, doc.gross_amount);
    }

    #[test]
    fn empty_period_produces_zero_report() {
        let doc = ReportBuilder::default()
            .build(&[], &[], &[], None, &labels())
            .unwrap();
        assert!(doc.rows.is_empty());
        assert_eq!(doc.totals.quantity, 0);
        assert_eq!(doc.net_payable, BigDecimal::zero());
        assert_eq!(doc.total_orders, 0);
    }

    #[test]
    fn missing_settings_fall_back_to_defaults() {
        let doc = ReportBuilder::default()
            .build(&[], &[], &[], None, &labels())
            .unwrap();
        assert_eq!(doc.company_name, "My Company");
        assert_eq!(doc.currency_symbol, "₹");
        assert!(doc.tax_id.is_none());
    }

    #[test]
    fn inconsistent_order_total_is_rejected() {
        // 订单总额与明细不一致
        let orders = vec![order(1, Some(A), date(2025, 1, 5), 9999)];
        let items = vec![item(1, (1, "Hoodie"), 10, 230)];

        let err = ReportBuilder::default()
            .build(&orders, &[], &items, None, &labels())
            .unwrap_err();
        assert!(matches!(err, BillingError::ReportMismatch { .. }));
    }

    #[test]
    fn sub_cent_drift_is_tolerated() {
        let mut o = order(1, Some(A), date(2025, 1, 5), 0);
        o.total_amount = "2300.004".parse().unwrap();
        let items = vec![item(1, (1, "Hoodie"), 10, 230)];

        assert!(ReportBuilder::default()
            .build(&[o], &[], &items, None, &labels())
            .is_ok());
    }

    #[test]
    fn build_report_labels_unfiltered_seller() {
        let doc = build_report(&[], &[], &[], None, "March 2025", None).unwrap();
        assert_eq!(doc.seller_label, ALL_SELLERS_LABEL);
        assert_eq!(doc.period_label, "March 2025");
        assert_eq!(doc.title, REPORT_TITLE);
    }

    #[test]
    fn csv_export_contains_rows_and_net() {
        let orders = vec![order(1, Some(A), date(2025, 1, 5), 10000)];
        let items = vec![item(1, (1, "Hoodie"), 40, 250)];
        let returns = vec![ret(A, date(2025, 1, 9), 6, 250)];

        let doc = ReportBuilder::default()
            .build(&orders, &returns, &items, Some(&settings()), &labels())
            .unwrap();
        let csv = String::from_utf8(doc.to_csv().unwrap()).unwrap();

        assert!(csv.contains("Category,Price/Piece,Quantity,Subtotal"));
        assert!(csv.contains("Hoodie,250,40,10000"));
        assert!(csv.contains("Returns / Deductions,,6,-1500"));
        assert!(csv.contains("Net Payable Amount,,,8500"));
    }
}
