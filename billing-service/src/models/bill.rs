//! Bill record: one sale linking a customer to a tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    Active,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Active => "active",
        }
    }
}

/// At most one bill may exist per `customer_id`; the store enforces this
/// with a unique index on the field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    #[serde(rename = "_id")]
    pub bill_id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub phone: Option<String>,
    pub tree_id: String,
    pub tree_measurement: String,
    pub tree_quantity: u32,
    pub total_amount: f64,
    pub amount_paid: f64,
    /// Stored redundantly; recomputed from the input on every create/update.
    pub balance: f64,
    pub status: BillStatus,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    /// Set only when a bill is edited, never at creation.
    pub last_edited: Option<mongodb::bson::DateTime>,
}

/// Validated input for creating or editing a bill.
#[derive(Debug, Clone)]
pub struct BillInput {
    pub customer_id: String,
    pub customer_name: String,
    pub phone: Option<String>,
    pub tree_id: String,
    pub tree_measurement: String,
    pub tree_quantity: u32,
    pub total_amount: f64,
    pub amount_paid: f64,
}

impl BillInput {
    pub fn balance(&self) -> f64 {
        self.total_amount - self.amount_paid
    }
}

/// Field set written back on edit. `last_edited` is stamped by the store.
#[derive(Debug, Clone)]
pub struct BillPatch {
    pub customer_id: String,
    pub customer_name: String,
    pub phone: Option<String>,
    pub tree_id: String,
    pub tree_measurement: String,
    pub tree_quantity: u32,
    pub total_amount: f64,
    pub amount_paid: f64,
    pub balance: f64,
}

impl From<BillInput> for BillPatch {
    fn from(input: BillInput) -> Self {
        let balance = input.balance();
        Self {
            customer_id: input.customer_id,
            customer_name: input.customer_name,
            phone: input.phone,
            tree_id: input.tree_id,
            tree_measurement: input.tree_measurement,
            tree_quantity: input.tree_quantity,
            total_amount: input.total_amount,
            amount_paid: input.amount_paid,
            balance,
        }
    }
}

impl Bill {
    pub fn new(input: BillInput) -> Self {
        let balance = input.balance();
        Self {
            bill_id: Uuid::new_v4().to_string(),
            customer_id: input.customer_id,
            customer_name: input.customer_name,
            phone: input.phone,
            tree_id: input.tree_id,
            tree_measurement: input.tree_measurement,
            tree_quantity: input.tree_quantity,
            total_amount: input.total_amount,
            amount_paid: input.amount_paid,
            balance,
            status: BillStatus::Active,
            created_at: Utc::now(),
            last_edited: None,
        }
    }
}
