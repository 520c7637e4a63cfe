use crate::config::BillingConfig;
use crate::handlers;
use crate::services::{
    BillGenerator, BillRepository, BillStore, MongoDb, PdfBillGenerator, TreeRepository, TreeStore,
};
use axum::middleware::from_fn;
use axum::{
    routing::{get, post},
    Router,
};
use chrono::FixedOffset;
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub bills: BillRepository,
    pub trees: TreeRepository,
    pub generator: Arc<dyn BillGenerator>,
    pub timezone: FixedOffset,
}

impl AppState {
    /// Wire the repositories and renderer over a pair of record stores.
    pub fn new(
        bill_store: Arc<dyn BillStore>,
        tree_store: Arc<dyn TreeStore>,
        timezone: FixedOffset,
    ) -> Self {
        Self {
            bills: BillRepository::new(bill_store.clone()),
            trees: TreeRepository::new(tree_store, bill_store),
            generator: Arc::new(PdfBillGenerator::new(timezone)),
            timezone,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::app::home))
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics_endpoint))
        .route(
            "/billing",
            get(handlers::bills::billing_page).post(handlers::bills::create_bill),
        )
        .route("/bills", get(handlers::bills::bills_page))
        .route(
            "/edit_bill/:bill_id",
            get(handlers::bills::edit_bill_page).post(handlers::bills::update_bill),
        )
        .route("/download_bill/:bill_id", get(handlers::bills::download_bill))
        .route("/customers", get(handlers::customers::customers_page))
        .route("/get_customer", get(handlers::customers::get_customer))
        .route(
            "/get_customer_bills/:customer_id",
            get(handlers::customers::get_customer_bills),
        )
        .route(
            "/trees",
            get(handlers::trees::trees_page),
        )
        .route("/add_tree", post(handlers::trees::add_tree))
        .route("/analytics", get(handlers::analytics::analytics_page))
        .route("/api/analytics", get(handlers::analytics::analytics_api))
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .with_state(state)
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    db: MongoDb,
}

impl Application {
    pub async fn build(config: BillingConfig) -> Result<Self, AppError> {
        let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database, &config.store)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                e
            })?;
        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let timezone = config.analytics.timezone()?;
        let store = Arc::new(db.clone());
        let state = AppState::new(store.clone(), store, timezone);

        let app = build_router(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            db,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn db(&self) -> &MongoDb {
        &self.db
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
