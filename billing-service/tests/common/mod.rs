//! Test harness: the application served over in-memory record stores, so
//! the suite runs without a live MongoDB.

use async_trait::async_trait;
use billing_service::models::{Bill, BillInput, BillPatch, Tree};
use billing_service::services::parse_utc_offset;
use billing_service::services::store::{BillStore, InsertBillError, TreeStore};
use billing_service::startup::{build_router, AppState};
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct InMemoryBillStore {
    bills: Mutex<Vec<Bill>>,
}

impl InMemoryBillStore {
    /// Insert directly, bypassing the repository, for test fixtures.
    pub fn seed(&self, bill: Bill) {
        self.bills.lock().unwrap().push(bill);
    }

    pub fn count(&self) -> usize {
        self.bills.lock().unwrap().len()
    }

    pub fn snapshot(&self, bill_id: &str) -> Option<Bill> {
        self.bills
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.bill_id == bill_id)
            .cloned()
    }

    pub fn first(&self) -> Option<Bill> {
        self.bills.lock().unwrap().first().cloned()
    }
}

#[async_trait]
impl BillStore for InMemoryBillStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn insert(&self, bill: &Bill) -> Result<(), InsertBillError> {
        let mut bills = self.bills.lock().unwrap();
        // Mirrors the unique index on customer_id.
        if bills.iter().any(|b| b.customer_id == bill.customer_id) {
            return Err(InsertBillError::DuplicateCustomer(bill.customer_id.clone()));
        }
        bills.push(bill.clone());
        Ok(())
    }

    async fn get(&self, bill_id: &str) -> Result<Option<Bill>, AppError> {
        Ok(self
            .bills
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.bill_id == bill_id)
            .cloned())
    }

    async fn update(&self, bill_id: &str, patch: &BillPatch) -> Result<bool, AppError> {
        let mut bills = self.bills.lock().unwrap();
        match bills.iter_mut().find(|b| b.bill_id == bill_id) {
            Some(bill) => {
                bill.customer_id = patch.customer_id.clone();
                bill.customer_name = patch.customer_name.clone();
                bill.phone = patch.phone.clone();
                bill.tree_id = patch.tree_id.clone();
                bill.tree_measurement = patch.tree_measurement.clone();
                bill.tree_quantity = patch.tree_quantity;
                bill.total_amount = patch.total_amount;
                bill.amount_paid = patch.amount_paid;
                bill.balance = patch.balance;
                bill.last_edited = Some(mongodb::bson::DateTime::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn all(&self) -> Result<Vec<Bill>, AppError> {
        Ok(self.bills.lock().unwrap().clone())
    }

    async fn all_newest_first(&self) -> Result<Vec<Bill>, AppError> {
        let mut bills = self.bills.lock().unwrap().clone();
        bills.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bills)
    }

    async fn by_customer_id(&self, customer_id: &str) -> Result<Vec<Bill>, AppError> {
        Ok(self
            .bills
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn first_by_customer_id(&self, customer_id: &str) -> Result<Option<Bill>, AppError> {
        Ok(self
            .bills
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.customer_id == customer_id)
            .cloned())
    }

    async fn first_by_customer_name(
        &self,
        customer_name: &str,
    ) -> Result<Option<Bill>, AppError> {
        Ok(self
            .bills
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.customer_name == customer_name)
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryTreeStore {
    trees: Mutex<Vec<Tree>>,
}

impl InMemoryTreeStore {
    pub fn seed(&self, tree: Tree) {
        self.trees.lock().unwrap().push(tree);
    }

    pub fn count(&self) -> usize {
        self.trees.lock().unwrap().len()
    }
}

#[async_trait]
impl TreeStore for InMemoryTreeStore {
    async fn insert(&self, tree: &Tree) -> Result<(), AppError> {
        self.trees.lock().unwrap().push(tree.clone());
        Ok(())
    }

    async fn all_by_tree_id(&self) -> Result<Vec<Tree>, AppError> {
        let mut trees = self.trees.lock().unwrap().clone();
        trees.sort_by(|a, b| a.tree_id.cmp(&b.tree_id));
        Ok(trees)
    }
}

pub struct TestApp {
    pub address: String,
    pub bills: Arc<InMemoryBillStore>,
    pub trees: Arc<InMemoryTreeStore>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let bills = Arc::new(InMemoryBillStore::default());
        let trees = Arc::new(InMemoryTreeStore::default());
        let timezone = parse_utc_offset("+05:30").expect("valid test offset");

        let state = AppState::new(bills.clone(), trees.clone(), timezone);
        let router = build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        // Redirects stay observable so tests can assert on them.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to build test client");

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            bills,
            trees,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

/// A bill fixture with a pinned creation time.
pub fn bill_at(
    customer_id: &str,
    tree_id: &str,
    total: f64,
    paid: f64,
    created_at: DateTime<Utc>,
) -> Bill {
    let mut bill = Bill::new(BillInput {
        customer_id: customer_id.to_string(),
        customer_name: format!("Customer {customer_id}"),
        phone: Some("9000000000".to_string()),
        tree_id: tree_id.to_string(),
        tree_measurement: "10ft".to_string(),
        tree_quantity: 1,
        total_amount: total,
        amount_paid: paid,
    });
    bill.created_at = created_at;
    bill
}

/// Complete form payload for bill creation/editing.
pub fn bill_form<'a>(customer_id: &'a str, total: &'a str, paid: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("customer_id", customer_id),
        ("customer_name", "Asha"),
        ("phone", "9000000000"),
        ("tree_id", "T-17"),
        ("tree_measurement", "12ft"),
        ("tree_quantity", "1"),
        ("total_amount", total),
        ("amount_paid", paid),
    ]
}
