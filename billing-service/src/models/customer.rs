use serde::Serialize;

/// Per-customer aggregate derived by scanning bills; never persisted.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CustomerSummary {
    pub customer_id: String,
    pub customer_name: String,
    pub phone: Option<String>,
    pub total_bills: u64,
    pub total_balance: f64,
}
