//! MongoDB record store: connection, index bootstrap, and the
//! `BillStore`/`TreeStore` implementations.
//!
//! Every round trip runs under a bounded timeout and is retried with
//! exponential backoff while the failure looks transport-level; logical
//! outcomes (duplicate key, not found) are never retried.

use crate::config::StoreConfig;
use crate::models::{Bill, BillPatch, Tree};
use crate::services::store::{BillStore, InsertBillError, TreeStore};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use futures::TryStreamExt;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{bson::doc, Client as MongoClient, Collection, Database, IndexModel};
use service_core::error::AppError;
use std::future::Future;
use std::time::Duration;

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
    request_timeout: Duration,
    retry_max_elapsed: Duration,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str, store: &StoreConfig) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Connected to MongoDB");
        Ok(Self {
            client,
            db,
            request_timeout: store.request_timeout(),
            retry_max_elapsed: store.retry_max_elapsed(),
        })
    }

    /// Create the indexes the repositories rely on. The unique index on
    /// `bills.customer_id` is what closes the read-then-write gap in
    /// duplicate-customer checking.
    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        let customer_id_unique = IndexModel::builder()
            .keys(doc! { "customer_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("customer_id_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        let created_at_sort = IndexModel::builder()
            .keys(doc! { "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("created_at_sort".to_string())
                    .build(),
            )
            .build();

        let customer_name_lookup = IndexModel::builder()
            .keys(doc! { "customer_name": 1 })
            .options(
                IndexOptions::builder()
                    .name("customer_name_lookup".to_string())
                    .build(),
            )
            .build();

        self.bills()
            .create_indexes(
                [customer_id_unique, created_at_sort, customer_name_lookup],
                None,
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to create indexes on bills collection: {}", e);
                AppError::from(e)
            })?;

        let tree_id_sort = IndexModel::builder()
            .keys(doc! { "tree_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("tree_id_sort".to_string())
                    .build(),
            )
            .build();

        self.trees().create_index(tree_id_sort, None).await.map_err(|e| {
            tracing::error!("Failed to create index on trees collection: {}", e);
            AppError::from(e)
        })?;

        tracing::info!("Billing service indexes initialized");
        Ok(())
    }

    pub fn bills(&self) -> Collection<Bill> {
        self.db.collection("bills")
    }

    pub fn trees(&self) -> Collection<Tree> {
        self.db.collection("trees")
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Run one store round trip under the configured timeout, retrying
    /// transient failures until the backoff budget is spent.
    async fn run<T, F, Fut>(&self, op: &'static str, f: F) -> Result<T, StoreFailure>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, mongodb::error::Error>>,
    {
        let policy = ExponentialBackoff {
            max_elapsed_time: Some(self.retry_max_elapsed),
            ..Default::default()
        };

        retry(policy, || async {
            match tokio::time::timeout(self.request_timeout, f()).await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) if is_transient(&err) => {
                    tracing::warn!(operation = op, error = %err, "Transient store failure, retrying");
                    Err(backoff::Error::transient(StoreFailure::Driver(err)))
                }
                Ok(Err(err)) => Err(backoff::Error::permanent(StoreFailure::Driver(err))),
                Err(_) => {
                    tracing::warn!(
                        operation = op,
                        timeout_ms = self.request_timeout.as_millis() as u64,
                        "Store round trip timed out, retrying"
                    );
                    Err(backoff::Error::transient(StoreFailure::Timeout))
                }
            }
        })
        .await
    }
}

enum StoreFailure {
    Timeout,
    Driver(mongodb::error::Error),
}

impl StoreFailure {
    fn is_duplicate_key(&self) -> bool {
        matches!(self, StoreFailure::Driver(err) if is_duplicate_key(err))
    }

    fn into_app(self, op: &'static str) -> AppError {
        match self {
            StoreFailure::Timeout => {
                AppError::StoreUnavailable(anyhow::anyhow!("{op}: store round trip timed out"))
            }
            StoreFailure::Driver(err) if is_transient(&err) => {
                AppError::StoreUnavailable(anyhow::Error::new(err))
            }
            StoreFailure::Driver(err) => AppError::from(err),
        }
    }
}

fn is_transient(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Io(_) | ErrorKind::ServerSelection { .. } | ErrorKind::ConnectionPoolCleared { .. }
    )
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::BulkWrite(failure) => failure
            .write_errors
            .as_ref()
            .is_some_and(|errors| errors.iter().any(|e| e.code == DUPLICATE_KEY_CODE)),
        _ => false,
    }
}

#[async_trait]
impl BillStore for MongoDb {
    async fn ping(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    async fn insert(&self, bill: &Bill) -> Result<(), InsertBillError> {
        let bills = self.bills();
        match self
            .run("insert_bill", || async {
                bills.insert_one(bill, None).await.map(|_| ())
            })
            .await
        {
            Ok(()) => Ok(()),
            Err(failure) if failure.is_duplicate_key() => {
                Err(InsertBillError::DuplicateCustomer(bill.customer_id.clone()))
            }
            Err(failure) => Err(InsertBillError::Store(failure.into_app("insert_bill"))),
        }
    }

    async fn get(&self, bill_id: &str) -> Result<Option<Bill>, AppError> {
        let bills = self.bills();
        self.run("get_bill", || async {
            bills.find_one(doc! { "_id": bill_id }, None).await
        })
        .await
        .map_err(|e| e.into_app("get_bill"))
    }

    async fn update(&self, bill_id: &str, patch: &BillPatch) -> Result<bool, AppError> {
        let bills = self.bills();
        let update = doc! {
            "$set": {
                "customer_id": &patch.customer_id,
                "customer_name": &patch.customer_name,
                "phone": patch.phone.clone(),
                "tree_id": &patch.tree_id,
                "tree_measurement": &patch.tree_measurement,
                "tree_quantity": patch.tree_quantity as i64,
                "total_amount": patch.total_amount,
                "amount_paid": patch.amount_paid,
                "balance": patch.balance,
                "last_edited": mongodb::bson::DateTime::now(),
            }
        };
        let result = self
            .run("update_bill", || async {
                bills
                    .update_one(doc! { "_id": bill_id }, update.clone(), None)
                    .await
            })
            .await
            .map_err(|e| e.into_app("update_bill"))?;
        Ok(result.matched_count > 0)
    }

    async fn all(&self) -> Result<Vec<Bill>, AppError> {
        let bills = self.bills();
        self.run("list_bills", || async {
            let cursor = bills.find(doc! {}, None).await?;
            cursor.try_collect().await
        })
        .await
        .map_err(|e| e.into_app("list_bills"))
    }

    async fn all_newest_first(&self) -> Result<Vec<Bill>, AppError> {
        let bills = self.bills();
        self.run("list_bills_newest_first", || async {
            let options = FindOptions::builder()
                .sort(doc! { "created_at": -1 })
                .build();
            let cursor = bills.find(doc! {}, options).await?;
            cursor.try_collect().await
        })
        .await
        .map_err(|e| e.into_app("list_bills_newest_first"))
    }

    async fn by_customer_id(&self, customer_id: &str) -> Result<Vec<Bill>, AppError> {
        let bills = self.bills();
        self.run("bills_by_customer", || async {
            let cursor = bills
                .find(doc! { "customer_id": customer_id }, None)
                .await?;
            cursor.try_collect().await
        })
        .await
        .map_err(|e| e.into_app("bills_by_customer"))
    }

    async fn first_by_customer_id(&self, customer_id: &str) -> Result<Option<Bill>, AppError> {
        let bills = self.bills();
        self.run("first_bill_by_customer_id", || async {
            bills
                .find_one(doc! { "customer_id": customer_id }, None)
                .await
        })
        .await
        .map_err(|e| e.into_app("first_bill_by_customer_id"))
    }

    async fn first_by_customer_name(
        &self,
        customer_name: &str,
    ) -> Result<Option<Bill>, AppError> {
        let bills = self.bills();
        self.run("first_bill_by_customer_name", || async {
            bills
                .find_one(doc! { "customer_name": customer_name }, None)
                .await
        })
        .await
        .map_err(|e| e.into_app("first_bill_by_customer_name"))
    }
}

#[async_trait]
impl TreeStore for MongoDb {
    async fn insert(&self, tree: &Tree) -> Result<(), AppError> {
        let trees = self.trees();
        self.run("insert_tree", || async {
            trees.insert_one(tree, None).await.map(|_| ())
        })
        .await
        .map_err(|e| e.into_app("insert_tree"))
    }

    async fn all_by_tree_id(&self) -> Result<Vec<Tree>, AppError> {
        let trees = self.trees();
        self.run("list_trees", || async {
            let options = FindOptions::builder().sort(doc! { "tree_id": 1 }).build();
            let cursor = trees.find(doc! {}, options).await?;
            cursor.try_collect().await
        })
        .await
        .map_err(|e| e.into_app("list_trees"))
    }
}
