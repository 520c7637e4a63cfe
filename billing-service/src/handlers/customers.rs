//! Customer views: the derived summary page, the lookup endpoint, and the
//! per-customer bill list.

use crate::dtos::{BillResponse, CustomerLookupQuery, CustomerPayload};
use crate::handlers::app::redirect_with_notice;
use crate::services::{summarize_customers, CustomerSearchKey};
use crate::startup::AppState;
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use service_core::error::AppError;

pub struct CustomerRow {
    pub customer_id: String,
    pub customer_name: String,
    pub phone: String,
    pub total_bills: u64,
    pub total_balance: String,
}

#[derive(Template)]
#[template(path = "customers.html")]
pub struct CustomersTemplate {
    pub customers: Vec<CustomerRow>,
}

/// GET /customers: unique customers with bill counts and balance totals,
/// derived fresh from the full bill scan.
pub async fn customers_page(State(state): State<AppState>) -> Response {
    match state.bills.all().await {
        Ok(bills) => {
            let customers = summarize_customers(&bills)
                .into_iter()
                .map(|summary| CustomerRow {
                    customer_id: summary.customer_id,
                    customer_name: summary.customer_name,
                    phone: summary.phone.unwrap_or_default(),
                    total_bills: summary.total_bills,
                    total_balance: format!("{:.2}", summary.total_balance),
                })
                .collect();
            CustomersTemplate { customers }.into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to fetch customers");
            redirect_with_notice("/", "Error fetching customers").into_response()
        }
    }
}

/// GET /get_customer?searchBy=id|name&value=...: limit-1 lookup. A missing
/// customer is a success with `customer: null`, not an error.
pub async fn get_customer(
    State(state): State<AppState>,
    Query(query): Query<CustomerLookupQuery>,
) -> Result<Json<Value>, AppError> {
    let (search_by, value) = match (query.search_by, query.value) {
        (Some(search_by), Some(value)) => (search_by, value),
        _ => {
            return Err(AppError::BadRequest(anyhow::anyhow!("Missing parameters")));
        }
    };

    let key = CustomerSearchKey::parse(&search_by)?;
    tracing::debug!(search_by = %search_by, value = %value, "Customer lookup");

    let customer = state
        .bills
        .find_customer(key, &value)
        .await?
        .map(|bill| CustomerPayload::from(&bill));

    Ok(Json(json!({
        "status": "success",
        "customer": customer,
    })))
}

/// GET /get_customer_bills/:customer_id: every bill for one customer.
pub async fn get_customer_bills(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Response {
    match state.bills.for_customer(&customer_id).await {
        Ok(bills) => {
            let bills: Vec<BillResponse> = bills
                .iter()
                .map(|bill| BillResponse::from_bill(bill, state.timezone))
                .collect();
            Json(bills).into_response()
        }
        Err(err) => {
            tracing::error!(customer_id = %customer_id, error = %err, "Failed to fetch customer bills");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Error fetching customer bills" })),
            )
                .into_response()
        }
    }
}
