//! Narrow record-store interfaces the repositories are written against.
//!
//! The production implementation is MongoDB (`database.rs`); tests run the
//! same repositories over in-memory fakes implementing these traits.

use crate::models::{Bill, BillPatch, Tree};
use async_trait::async_trait;
use service_core::error::AppError;
use thiserror::Error;

/// Insert can fail logically (unique `customer_id` taken) as well as at the
/// transport level; callers must tell the two apart.
#[derive(Debug, Error)]
pub enum InsertBillError {
    #[error("a bill already exists for customer {0}")]
    DuplicateCustomer(String),
    #[error(transparent)]
    Store(#[from] AppError),
}

#[async_trait]
pub trait BillStore: Send + Sync {
    /// Transport-level liveness probe.
    async fn ping(&self) -> Result<(), AppError>;

    async fn insert(&self, bill: &Bill) -> Result<(), InsertBillError>;

    async fn get(&self, bill_id: &str) -> Result<Option<Bill>, AppError>;

    /// Apply `patch` and stamp `last_edited`. Returns false when no bill
    /// exists at `bill_id`.
    async fn update(&self, bill_id: &str, patch: &BillPatch) -> Result<bool, AppError>;

    /// Full scan, store-defined order.
    async fn all(&self) -> Result<Vec<Bill>, AppError>;

    /// Full scan ordered by creation time descending.
    async fn all_newest_first(&self) -> Result<Vec<Bill>, AppError>;

    async fn by_customer_id(&self, customer_id: &str) -> Result<Vec<Bill>, AppError>;

    async fn first_by_customer_id(&self, customer_id: &str) -> Result<Option<Bill>, AppError>;

    async fn first_by_customer_name(&self, customer_name: &str)
        -> Result<Option<Bill>, AppError>;
}

#[async_trait]
pub trait TreeStore: Send + Sync {
    async fn insert(&self, tree: &Tree) -> Result<(), AppError>;

    /// Full scan ordered lexically ascending by `tree_id`.
    async fn all_by_tree_id(&self) -> Result<Vec<Tree>, AppError>;
}
