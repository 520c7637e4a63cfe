pub mod bill;
pub mod customer;
pub mod tree;

pub use bill::{Bill, BillInput, BillPatch, BillStatus};
pub use customer::CustomerSummary;
pub use tree::{SaleInfo, Tree, TreeInput, TreeStatus, TreeView};
