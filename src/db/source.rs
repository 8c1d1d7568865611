use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::queries;
use crate::error::BillingResult;
use crate::models::{CompanySettings, DateRange, Order, OrderItem, Return, Seller};

/// 汇总所需的只读数据源
///
/// 任何读取失败都以 `BillingError::DataUnavailable` 原样返回, 不在这一层重试。
#[async_trait]
pub trait BillingSource: Send + Sync {
    async fn list_sellers(&self) -> BillingResult<Vec<Seller>>;

    async fn list_orders(&self, range: DateRange, seller: Option<Uuid>)
        -> BillingResult<Vec<Order>>;

    async fn list_order_items(&self, order_ids: &[Uuid]) -> BillingResult<Vec<OrderItem>>;

    async fn list_returns(
        &self,
        range: DateRange,
        seller: Option<Uuid>,
    ) -> BillingResult<Vec<Return>>;

    async fn get_company_settings(&self) -> BillingResult<Option<CompanySettings>>;
}

#[async_trait]
impl BillingSource for PgPool {
    async fn list_sellers(&self) -> BillingResult<Vec<Seller>> {
        Ok(queries::list_sellers(self).await?)
    }

    async fn list_orders(
        &self,
        range: DateRange,
        seller: Option<Uuid>,
    ) -> BillingResult<Vec<Order>> {
        Ok(queries::list_orders(self, range, seller).await?)
    }

    async fn list_order_items(&self, order_ids: &[Uuid]) -> BillingResult<Vec<OrderItem>> {
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(queries::list_order_items(self, order_ids).await?)
    }

    async fn list_returns(
        &self,
        range: DateRange,
        seller: Option<Uuid>,
    ) -> BillingResult<Vec<Return>> {
        Ok(queries::list_returns(self, range, seller).await?)
    }

    async fn get_company_settings(&self) -> BillingResult<Option<CompanySettings>> {
        Ok(queries::get_company_settings(self).await?)
    }
}
