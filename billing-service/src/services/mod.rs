pub mod analytics;
pub mod billgen;
pub mod database;
pub mod metrics;
pub mod repository;
pub mod store;
pub mod views;

pub use analytics::{bucket_revenue, parse_utc_offset, RevenueBuckets};
pub use billgen::{BillGenerator, PdfBillGenerator};
pub use database::MongoDb;
pub use metrics::{get_metrics, init_metrics};
pub use repository::{BillRepository, CreateBillError, CustomerSearchKey, TreeRepository};
pub use store::{BillStore, InsertBillError, TreeStore};
pub use views::{merge_tree_views, summarize_customers};
