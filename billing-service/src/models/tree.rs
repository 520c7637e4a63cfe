//! Tree inventory record and the merged read-time view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TreeStatus {
    Available,
    Sold,
}

impl TreeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TreeStatus::Available => "available",
            TreeStatus::Sold => "sold",
        }
    }
}

/// Inventory record. `tree_id` is the business key; it carries no
/// uniqueness guarantee, the store identity is `document_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    #[serde(rename = "_id")]
    pub document_id: String,
    pub tree_id: String,
    pub size: String,
    pub description: String,
    pub status: TreeStatus,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// Validated input for adding an inventory tree.
#[derive(Debug, Clone)]
pub struct TreeInput {
    pub tree_id: String,
    pub size: String,
    pub description: String,
}

impl Tree {
    pub fn new(input: TreeInput) -> Self {
        Self {
            document_id: Uuid::new_v4().to_string(),
            tree_id: input.tree_id,
            size: input.size,
            description: input.description,
            status: TreeStatus::Available,
            created_at: Utc::now(),
        }
    }
}

/// Sale details merged into a tree view from the bill that sold it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SaleInfo {
    pub customer_name: String,
    pub bill_id: String,
    pub amount: f64,
    pub bill_date: DateTime<Utc>,
}

/// Read-time merge of inventory and sale state; never persisted. A tree is
/// `sold` exactly when at least one bill references its `tree_id`.
#[derive(Debug, Clone, Serialize)]
pub struct TreeView {
    pub tree_id: String,
    pub size: String,
    pub description: Option<String>,
    pub status: TreeStatus,
    pub sale: Option<SaleInfo>,
}

impl TreeView {
    pub fn from_inventory(tree: &Tree) -> Self {
        Self {
            tree_id: tree.tree_id.clone(),
            size: tree.size.clone(),
            description: Some(tree.description.clone()),
            status: TreeStatus::Available,
            sale: None,
        }
    }
}
