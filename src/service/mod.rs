pub mod aggregator;
pub mod dashboard;
pub mod invalidation;
pub mod pricing;
pub mod report;

pub use aggregator::aggregate;
pub use dashboard::{DashboardService, WindowData};
pub use invalidation::{Invalidation, InvalidationBus};
pub use report::{build_report, ReportBuilder, ReportLabels};
