//! Bill and tree repositories: the aggregation and lookup logic layered
//! over the record store.

use crate::models::{Bill, BillInput, BillPatch, Tree, TreeInput, TreeView};
use crate::services::store::{BillStore, InsertBillError, TreeStore};
use crate::services::views::merge_tree_views;
use service_core::error::AppError;
use std::sync::Arc;
use thiserror::Error;

/// Identity of the customer already holding a bill, returned on a
/// duplicate-customer rejection so the caller can disambiguate.
#[derive(Debug, Clone)]
pub struct ExistingCustomer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
}

impl From<Bill> for ExistingCustomer {
    fn from(bill: Bill) -> Self {
        Self {
            id: bill.customer_id,
            name: bill.customer_name,
            phone: bill.phone,
        }
    }
}

#[derive(Debug, Error)]
pub enum CreateBillError {
    #[error("Customer ID already exists")]
    DuplicateCustomer(ExistingCustomer),
    #[error(transparent)]
    Other(#[from] AppError),
}

/// Which bill field a customer lookup matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerSearchKey {
    Id,
    Name,
}

impl CustomerSearchKey {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "id" => Ok(CustomerSearchKey::Id),
            "name" => Ok(CustomerSearchKey::Name),
            other => Err(AppError::BadRequest(anyhow::anyhow!(
                "searchBy must be 'id' or 'name', got '{other}'"
            ))),
        }
    }
}

#[derive(Clone)]
pub struct BillRepository {
    store: Arc<dyn BillStore>,
}

impl BillRepository {
    pub fn new(store: Arc<dyn BillStore>) -> Self {
        Self { store }
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        self.store.ping().await
    }

    /// Create a bill, enforcing at most one bill per `customer_id`.
    ///
    /// The pre-insert scan supplies the conflicting customer's identity for
    /// the rejection payload; the store's unique index catches the race
    /// where two creations pass the scan concurrently, in which case the
    /// loser re-reads the winner.
    pub async fn create(&self, input: BillInput) -> Result<Bill, CreateBillError> {
        if let Some(existing) = self.store.first_by_customer_id(&input.customer_id).await? {
            tracing::info!(
                customer_id = %input.customer_id,
                "Rejected bill creation for existing customer"
            );
            metrics::counter!("bill_create_duplicates_total").increment(1);
            return Err(CreateBillError::DuplicateCustomer(existing.into()));
        }

        let bill = Bill::new(input);
        match self.store.insert(&bill).await {
            Ok(()) => {
                tracing::info!(
                    bill_id = %bill.bill_id,
                    customer_id = %bill.customer_id,
                    total_amount = bill.total_amount,
                    "Bill created"
                );
                metrics::counter!("bills_created_total").increment(1);
                Ok(bill)
            }
            Err(InsertBillError::DuplicateCustomer(customer_id)) => {
                tracing::info!(
                    customer_id = %customer_id,
                    "Lost duplicate-customer race, reporting winner"
                );
                match self.store.first_by_customer_id(&customer_id).await? {
                    Some(winner) => Err(CreateBillError::DuplicateCustomer(winner.into())),
                    None => Err(CreateBillError::Other(AppError::Conflict(anyhow::anyhow!(
                        "Customer ID already exists"
                    )))),
                }
            }
            Err(InsertBillError::Store(err)) => Err(err.into()),
        }
    }

    /// All bills, newest first.
    pub async fn list(&self) -> Result<Vec<Bill>, AppError> {
        self.store.all_newest_first().await
    }

    /// Full scan in store order, for the derived views.
    pub async fn all(&self) -> Result<Vec<Bill>, AppError> {
        self.store.all().await
    }

    pub async fn get(&self, bill_id: &str) -> Result<Bill, AppError> {
        self.store
            .get(bill_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Bill not found")))
    }

    /// Re-validate, recompute the balance, and stamp `last_edited`.
    /// `customer_id` uniqueness is deliberately not re-checked on edit.
    pub async fn update(&self, bill_id: &str, input: BillInput) -> Result<(), AppError> {
        let patch = BillPatch::from(input);
        let matched = self.store.update(bill_id, &patch).await?;
        if !matched {
            return Err(AppError::NotFound(anyhow::anyhow!("Bill not found")));
        }
        tracing::info!(bill_id = %bill_id, balance = patch.balance, "Bill updated");
        Ok(())
    }

    pub async fn for_customer(&self, customer_id: &str) -> Result<Vec<Bill>, AppError> {
        self.store.by_customer_id(customer_id).await
    }

    /// Limit-1 lookup by customer id or exact name. Absence is `None`, not
    /// an error.
    pub async fn find_customer(
        &self,
        key: CustomerSearchKey,
        value: &str,
    ) -> Result<Option<Bill>, AppError> {
        let value = value.trim();
        match key {
            CustomerSearchKey::Id => self.store.first_by_customer_id(value).await,
            CustomerSearchKey::Name => self.store.first_by_customer_name(value).await,
        }
    }
}

#[derive(Clone)]
pub struct TreeRepository {
    trees: Arc<dyn TreeStore>,
    bills: Arc<dyn BillStore>,
}

impl TreeRepository {
    pub fn new(trees: Arc<dyn TreeStore>, bills: Arc<dyn BillStore>) -> Self {
        Self { trees, bills }
    }

    /// Add an inventory tree. `tree_id` carries no uniqueness check.
    pub async fn add(&self, input: TreeInput) -> Result<Tree, AppError> {
        let tree = Tree::new(input);
        self.trees.insert(&tree).await?;
        tracing::info!(
            tree_id = %tree.tree_id,
            document_id = %tree.document_id,
            "Tree added"
        );
        metrics::counter!("trees_added_total").increment(1);
        Ok(tree)
    }

    /// Inventory merged with bill-derived sale status, ascending by
    /// `tree_id`.
    pub async fn list(&self) -> Result<Vec<TreeView>, AppError> {
        let inventory = self.trees.all_by_tree_id().await?;
        let bills = self.bills.all().await?;
        Ok(merge_tree_views(inventory, &bills))
    }
}
