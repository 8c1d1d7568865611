use chrono::NaiveDate;
use uuid::Uuid;

use crate::config::ReportConfig;
use crate::db::BillingSource;
use crate::error::{BillingError, BillingResult};
use crate::models::{
    Aggregation, ChartData, DashboardStats, DateRange, Order, OrderItem, ReportDocument,
    ReportMonth, Return,
};
use crate::service::aggregator::aggregate;
use crate::service::report::{ReportBuilder, ReportLabels, ALL_SELLERS_LABEL};

/// 一个窗口内独立拉取的三组记录
#[derive(Debug, Clone, Default)]
pub struct WindowData {
    pub orders: Vec<Order>,
    pub items: Vec<OrderItem>,
    pub returns: Vec<Return>,
}

impl WindowData {
    pub fn aggregate(&self) -> Aggregation {
        aggregate(&self.orders, &self.items, &self.returns)
    }
}

/// 仪表盘/报表服务: 拉数据 + 调用汇总引擎
pub struct DashboardService<S> {
    source: S,
    reports: ReportBuilder,
}

impl<S: BillingSource> DashboardService<S> {
    pub fn new(source: S, report_defaults: ReportConfig) -> Self {
        Self {
            source,
            reports: ReportBuilder::new(report_defaults),
        }
    }

    #[cfg(test)]
    pub(crate) fn source(&self) -> &S {
        &self.source
    }

    /// 订单与退货并发查询, 再按已拿到的订单ID查明细
    pub async fn fetch_window(
        &self,
        range: DateRange,
        seller: Option<Uuid>,
    ) -> BillingResult<WindowData> {
        let (orders, returns) = futures::try_join!(
            self.source.list_orders(range, seller),
            self.source.list_returns(range, seller),
        )
        .map_err(|e| {
            tracing::error!("Fetching {}..{} failed: {}", range.from, range.to, e);
            e
        })?;

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let items = if order_ids.is_empty() {
            Vec::new()
        } else {
            self.source.list_order_items(&order_ids).await?
        };

        Ok(WindowData {
            orders,
            items,
            returns,
        })
    }

    /// 本月 (1 日至 today) 的仪表盘卡片
    pub async fn stats(&self, today: NaiveDate) -> BillingResult<DashboardStats> {
        let window = self.fetch_window(DateRange::month_to_date(today), None).await?;
        let agg = window.aggregate();
        let todays_orders = window
            .orders
            .iter()
            .filter(|o| o.order_date == today)
            .count();

        tracing::info!(
            "Dashboard stats for {}: {} orders today, gross {}, net {}",
            today,
            todays_orders,
            agg.gross_amount,
            agg.net_payable
        );
        Ok(DashboardStats::from_aggregation(&agg, todays_orders))
    }

    /// 图表数据
    pub async fn chart_data(&self, range: DateRange) -> BillingResult<ChartData> {
        let agg = self.fetch_window(range, None).await?.aggregate();
        tracing::info!(
            "Chart data for {}..{}: {} points, {} categories, {} suppliers",
            range.from,
            range.to,
            agg.orders_over_time.len(),
            agg.category_breakdown.len(),
            agg.suppliers.len()
        );
        Ok(ChartData::from(agg))
    }

    /// 某月某供货商 (或全部) 的报表文档
    pub async fn report(
        &self,
        month: ReportMonth,
        seller: Option<Uuid>,
        generated_on: NaiveDate,
    ) -> BillingResult<ReportDocument> {
        let range = month
            .range()
            .ok_or_else(|| BillingError::Validation(format!("invalid month {:?}", month)))?;

        let (window, sellers, settings) = futures::try_join!(
            self.fetch_window(range, seller),
            self.source.list_sellers(),
            self.source.get_company_settings(),
        )?;

        let seller_label = match seller {
            None => ALL_SELLERS_LABEL.to_string(),
            Some(id) => sellers
                .iter()
                .find(|s| s.id == id)
                .map(|s| s.name.clone())
                .ok_or_else(|| BillingError::not_found("seller", id))?,
        };

        let labels = ReportLabels {
            period_label: month.label(),
            seller_label,
            generated_on,
        };
        let agg = window.aggregate();
        let doc = self
            .reports
            .from_aggregation(&agg, settings.as_ref(), &labels)?;

        tracing::info!(
            "Report {} built: {} rows, gross {}, net {}",
            doc.file_name,
            doc.rows.len(),
            doc.gross_amount,
            doc.net_payable
        );
        Ok(doc)
    }
}
