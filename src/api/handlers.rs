use crate::db::{queries, queries_catalog, queries_ledger};
use crate::error::{BillingError, BillingResult};
use crate::models::{
    CategoryUpdate, ChartData, CompanySettings, DashboardStats, DateRange, NewCategory, NewOrder,
    NewReturn, NewSeller, Order, OrderWithItems, ProductCategory, ReportDocument, ReportMonth,
    Return, Seller, SellerUpdate, SettingsUpdate,
};
use crate::service::invalidation::{
    CATEGORY_MUTATION, ORDER_MUTATION, RETURN_MUTATION, SELLER_MUTATION, SETTINGS_MUTATION,
};
use crate::service::{DashboardService, InvalidationBus};
use axum::{
    extract::{Json, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{Duration, Local, NaiveDate};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// 共享状态
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub dashboard: Arc<DashboardService<PgPool>>,
    pub bus: InvalidationBus,
}

/// 图表时间窗口, 缺省为最近 30 天
#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ChartQuery {
    pub fn range(&self, today: NaiveDate) -> BillingResult<DateRange> {
        let to = self.to.unwrap_or(today);
        let from = match self.from {
            Some(from) => from,
            None => to.checked_sub_signed(Duration::days(29)).ok_or_else(|| {
                BillingError::Validation(format!("no 30-day window ends on {}", to))
            })?,
        };
        DateRange::new(from, to)
            .ok_or_else(|| BillingError::Validation(format!("from {} is after to {}", from, to)))
    }
}

/// 报表参数: month=YYYY-MM, seller_id 缺省为全部供货商
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub month: String,
    pub seller_id: Option<Uuid>,
}

impl ReportQuery {
    pub fn month(&self) -> BillingResult<ReportMonth> {
        ReportMonth::parse(&self.month).ok_or_else(|| {
            BillingError::Validation(format!("month must be YYYY-MM, got {:?}", self.month))
        })
    }
}

/// 下载文件名来自公司名 (用户可编辑), 只保留可安全放入引号内的 ASCII 字符
fn attachment_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

// ---------------------------------------------------------------------------
// Dashboard / reports
// ---------------------------------------------------------------------------

pub async fn dashboard_stats(State(state): State<AppState>) -> BillingResult<Json<DashboardStats>> {
    Ok(Json(state.dashboard.stats(today()).await?))
}

pub async fn dashboard_charts(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> BillingResult<Json<ChartData>> {
    let range = query.range(today())?;
    Ok(Json(state.dashboard.chart_data(range).await?))
}

async fn monthly_report(state: &AppState, query: &ReportQuery) -> BillingResult<ReportDocument> {
    let month = query.month()?;
    state
        .dashboard
        .report(month, query.seller_id, today())
        .await
}

pub async fn report_json(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> BillingResult<Json<ReportDocument>> {
    Ok(Json(monthly_report(&state, &query).await?))
}

pub async fn report_csv(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> BillingResult<Response> {
    let doc = monthly_report(&state, &query).await?;
    let body = doc.to_csv()?;
    let file_name = doc.file_name.trim_end_matches(".pdf").to_string() + ".csv";

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, attachment_disposition(&file_name)),
        ],
        body,
    )
        .into_response())
}

// ---------------------------------------------------------------------------
// Sellers
// ---------------------------------------------------------------------------

pub async fn list_sellers(State(state): State<AppState>) -> BillingResult<Json<Vec<Seller>>> {
    Ok(Json(queries::list_sellers(&state.pool).await?))
}

pub async fn create_seller(
    State(state): State<AppState>,
    Json(req): Json<NewSeller>,
) -> BillingResult<(StatusCode, Json<Seller>)> {
    let seller = queries_catalog::create_seller(&state.pool, &req).await?;
    state.bus.publish(SELLER_MUTATION);
    Ok((StatusCode::CREATED, Json(seller)))
}

pub async fn update_seller(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SellerUpdate>,
) -> BillingResult<Json<Seller>> {
    let seller = queries_catalog::update_seller(&state.pool, id, &req).await?;
    state.bus.publish(SELLER_MUTATION);
    Ok(Json(seller))
}

pub async fn delete_seller(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> BillingResult<StatusCode> {
    queries_catalog::delete_seller(&state.pool, id).await?;
    state.bus.publish(SELLER_MUTATION);
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

pub async fn list_categories(
    State(state): State<AppState>,
) -> BillingResult<Json<Vec<ProductCategory>>> {
    Ok(Json(queries::list_categories(&state.pool).await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(req): Json<NewCategory>,
) -> BillingResult<(StatusCode, Json<ProductCategory>)> {
    let category = queries_catalog::create_category(&state.pool, &req).await?;
    state.bus.publish(CATEGORY_MUTATION);
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CategoryUpdate>,
) -> BillingResult<Json<ProductCategory>> {
    let category = queries_catalog::update_category(&state.pool, id, &req).await?;
    state.bus.publish(CATEGORY_MUTATION);
    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> BillingResult<StatusCode> {
    queries_catalog::delete_category(&state.pool, id).await?;
    state.bus.publish(CATEGORY_MUTATION);
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

pub async fn list_orders(State(state): State<AppState>) -> BillingResult<Json<Vec<Order>>> {
    Ok(Json(queries::list_all_orders(&state.pool).await?))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> BillingResult<Json<OrderWithItems>> {
    queries::get_order_with_items(&state.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| BillingError::not_found("order", id))
}

pub async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<NewOrder>,
) -> BillingResult<(StatusCode, Json<OrderWithItems>)> {
    let order = queries_ledger::create_order(&state.pool, &req).await?;
    state.bus.publish(ORDER_MUTATION);
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<NewOrder>,
) -> BillingResult<Json<OrderWithItems>> {
    let order = queries_ledger::update_order(&state.pool, id, &req).await?;
    state.bus.publish(ORDER_MUTATION);
    Ok(Json(order))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> BillingResult<StatusCode> {
    queries_ledger::delete_order(&state.pool, id).await?;
    state.bus.publish(ORDER_MUTATION);
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Returns
// ---------------------------------------------------------------------------

pub async fn list_returns(State(state): State<AppState>) -> BillingResult<Json<Vec<Return>>> {
    Ok(Json(queries::list_all_returns(&state.pool).await?))
}

pub async fn create_return(
    State(state): State<AppState>,
    Json(req): Json<NewReturn>,
) -> BillingResult<(StatusCode, Json<Return>)> {
    let ret = queries_ledger::create_return(&state.pool, &req).await?;
    state.bus.publish(RETURN_MUTATION);
    Ok((StatusCode::CREATED, Json(ret)))
}

pub async fn update_return(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<NewReturn>,
) -> BillingResult<Json<Return>> {
    let ret = queries_ledger::update_return(&state.pool, id, &req).await?;
    state.bus.publish(RETURN_MUTATION);
    Ok(Json(ret))
}

pub async fn delete_return(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> BillingResult<StatusCode> {
    queries_ledger::delete_return(&state.pool, id).await?;
    state.bus.publish(RETURN_MUTATION);
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

pub async fn get_settings(
    State(state): State<AppState>,
) -> BillingResult<Json<Option<CompanySettings>>> {
    Ok(Json(queries::get_company_settings(&state.pool).await?))
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(req): Json<SettingsUpdate>,
) -> BillingResult<Json<CompanySettings>> {
    let settings = queries_catalog::upsert_company_settings(&state.pool, &req).await?;
    state.bus.publish(SETTINGS_MUTATION);
    Ok(Json(settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn chart_query_defaults_to_last_30_days() {
        let q = ChartQuery { from: None, to: None };
        let range = q.range(d(2025, 1, 30)).unwrap();
        assert_eq!(range.from, d(2025, 1, 1));
        assert_eq!(range.to, d(2025, 1, 30));
    }

    #[test]
    fn chart_query_rejects_inverted_range() {
        let q = ChartQuery {
            from: Some(d(2025, 2, 1)),
            to: Some(d(2025, 1, 1)),
        };
        assert!(matches!(q.range(d(2025, 3, 1)), Err(BillingError::Validation(_))));
    }

    #[test]
    fn chart_query_rejects_window_before_min_date() {
        let q = ChartQuery {
            from: None,
            to: Some(NaiveDate::MIN),
        };
        let err = q.range(d(2025, 1, 1)).unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        // 显式给出 from 时不需要回推窗口
        let explicit = ChartQuery {
            from: Some(NaiveDate::MIN),
            to: Some(NaiveDate::MIN),
        };
        assert_eq!(explicit.range(d(2025, 1, 1)).unwrap().from, NaiveDate::MIN);
    }

    #[test]
    fn attachment_name_cannot_break_header() {
        let value = attachment_disposition("Acme \"Quoted\"\r\n;x=1_All Sellers_January_2025.csv");
        assert_eq!(
            value,
            "attachment; filename=\"Acme__Quoted____x_1_All_Sellers_January_2025.csv\""
        );
        assert!(header::HeaderValue::from_str(&value).is_ok());
        assert_eq!(
            attachment_disposition("Café_All Sellers.csv"),
            "attachment; filename=\"Caf__All_Sellers.csv\""
        );
    }

    #[test]
    fn report_query_validates_month() {
        let ok = ReportQuery {
            month: "2025-01".to_string(),
            seller_id: None,
        };
        assert_eq!(ok.month().unwrap(), ReportMonth { year: 2025, month: 1 });

        let bad = ReportQuery {
            month: "01/2025".to_string(),
            seller_id: None,
        };
        let err = bad.month().unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
