pub mod pool;
pub mod queries;
pub mod queries_catalog;
pub mod queries_ledger;
pub mod source;

pub use pool::create_pool;
pub use source::BillingSource;
