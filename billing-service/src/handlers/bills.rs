//! Bill endpoints: creation form, listing, editing, and PDF download.

use crate::dtos::{display_date, BillForm};
use crate::handlers::app::{redirect_with_notice, NoticeParams};
use crate::models::Bill;
use crate::services::CreateBillError;
use crate::startup::AppState;
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use chrono::FixedOffset;
use serde_json::json;
use service_core::error::AppError;

#[derive(Template)]
#[template(path = "billing.html")]
pub struct BillingTemplate {}

/// Bill rendered for the tables and the edit form.
pub struct BillRow {
    pub bill_id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub phone: String,
    pub tree_id: String,
    pub tree_measurement: String,
    pub tree_quantity: u32,
    pub total_amount: String,
    pub amount_paid: String,
    pub balance: String,
    pub date: String,
}

impl BillRow {
    pub fn from_bill(bill: &Bill, tz: FixedOffset) -> Self {
        Self {
            bill_id: bill.bill_id.clone(),
            customer_id: bill.customer_id.clone(),
            customer_name: bill.customer_name.clone(),
            phone: bill.phone.clone().unwrap_or_default(),
            tree_id: bill.tree_id.clone(),
            tree_measurement: bill.tree_measurement.clone(),
            tree_quantity: bill.tree_quantity,
            total_amount: format!("{:.2}", bill.total_amount),
            amount_paid: format!("{:.2}", bill.amount_paid),
            balance: format!("{:.2}", bill.balance),
            date: display_date(bill.created_at, tz),
        }
    }
}

#[derive(Template)]
#[template(path = "bills.html")]
pub struct BillsTemplate {
    pub bills: Vec<BillRow>,
    pub notice: Option<String>,
}

#[derive(Template)]
#[template(path = "editbill.html")]
pub struct EditBillTemplate {
    pub bill: BillRow,
}

/// GET /billing: the bill-entry form.
pub async fn billing_page() -> impl IntoResponse {
    BillingTemplate {}
}

/// POST /billing: create a bill. Duplicate customers are rejected with the
/// conflicting customer's identity so the caller can disambiguate.
pub async fn create_bill(
    State(state): State<AppState>,
    Form(form): Form<BillForm>,
) -> Result<Response, AppError> {
    let input = form.into_input()?;

    match state.bills.create(input).await {
        Ok(_) => Ok(Json(json!({
            "status": "success",
            "message": "Bill saved successfully!"
        }))
        .into_response()),
        Err(CreateBillError::DuplicateCustomer(existing)) => Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "status": "error",
                "message": "Customer ID already exists",
                "customer": {
                    "name": existing.name,
                    "phone": existing.phone,
                    "id": existing.id,
                }
            })),
        )
            .into_response()),
        Err(CreateBillError::Other(err)) => Err(err),
    }
}

/// GET /bills: all bills, newest first.
pub async fn bills_page(
    State(state): State<AppState>,
    Query(params): Query<NoticeParams>,
) -> Response {
    match state.bills.list().await {
        Ok(bills) => {
            let rows = bills
                .iter()
                .map(|bill| BillRow::from_bill(bill, state.timezone))
                .collect();
            BillsTemplate {
                bills: rows,
                notice: params.notice,
            }
            .into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to fetch bills");
            redirect_with_notice("/", "Error fetching bills").into_response()
        }
    }
}

/// GET /edit_bill/:id: the pre-filled edit form.
pub async fn edit_bill_page(
    State(state): State<AppState>,
    Path(bill_id): Path<String>,
) -> Response {
    match state.bills.get(&bill_id).await {
        Ok(bill) => EditBillTemplate {
            bill: BillRow::from_bill(&bill, state.timezone),
        }
        .into_response(),
        Err(AppError::NotFound(_)) => {
            redirect_with_notice("/bills", "Bill not found!").into_response()
        }
        Err(err) => {
            tracing::error!(bill_id = %bill_id, error = %err, "Failed to fetch bill for editing");
            redirect_with_notice("/bills", "Error fetching bill").into_response()
        }
    }
}

/// POST /edit_bill/:id: update and bounce back to the bill list.
pub async fn update_bill(
    State(state): State<AppState>,
    Path(bill_id): Path<String>,
    Form(form): Form<BillForm>,
) -> Response {
    let input = match form.into_input() {
        Ok(input) => input,
        Err(err) => {
            tracing::warn!(bill_id = %bill_id, error = %err, "Rejected bill edit");
            return redirect_with_notice("/bills", &format!("Error: {err}")).into_response();
        }
    };

    match state.bills.update(&bill_id, input).await {
        Ok(()) => redirect_with_notice("/bills", "Bill updated successfully!").into_response(),
        Err(AppError::NotFound(_)) => {
            redirect_with_notice("/bills", "Bill not found!").into_response()
        }
        Err(err) => {
            tracing::error!(bill_id = %bill_id, error = %err, "Failed to update bill");
            redirect_with_notice("/bills", "Error updating bill").into_response()
        }
    }
}

/// GET /download_bill/:id: stream the rendered bill document.
pub async fn download_bill(
    State(state): State<AppState>,
    Path(bill_id): Path<String>,
) -> Response {
    let bill = match state.bills.get(&bill_id).await {
        Ok(bill) => bill,
        Err(AppError::NotFound(_)) => {
            return redirect_with_notice("/bills", "Bill not found!").into_response();
        }
        Err(err) => {
            tracing::error!(bill_id = %bill_id, error = %err, "Failed to fetch bill for download");
            return redirect_with_notice("/bills", "Error generating bill").into_response();
        }
    };

    match state.generator.render(&bill) {
        Ok(bytes) => {
            tracing::info!(bill_id = %bill_id, size = bytes.len(), "Bill document generated");
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"bill_{bill_id}.pdf\""),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(err) => {
            tracing::error!(bill_id = %bill_id, error = %err, "Failed to render bill document");
            redirect_with_notice("/bills", "Error generating bill").into_response()
        }
    }
}
