pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;

pub use config::AppConfig;
pub use db::{create_pool, BillingSource};
pub use error::{BillingError, BillingResult};
pub use service::{aggregate, build_report, DashboardService, InvalidationBus};
