pub mod category;
pub mod order;
pub mod period;
pub mod report;
pub mod returns;
pub mod seller;
pub mod settings;
pub mod stats;

pub use category::{CategoryUpdate, NewCategory, ProductCategory};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderWithItems, PricedItem};
pub use period::{DateRange, ReportMonth};
pub use report::{ReportDocument, ReportRow, ReportTotals, ReturnsBlock};
pub use returns::{NewReturn, Return};
pub use seller::{NewSeller, Seller, SellerUpdate};
pub use settings::{CompanySettings, SettingsUpdate};
pub use stats::{
    Aggregation, CategoryBreakdown, CategoryPieces, ChartData, DashboardStats, SupplierTotals,
    TimePoint, TopSeller,
};

/// 关联记录缺失时的展示名
pub const UNKNOWN_LABEL: &str = "Unknown";
