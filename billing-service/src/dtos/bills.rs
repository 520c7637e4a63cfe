//! Bill request/response shapes for the form endpoints and the JSON API.

use crate::models::{Bill, BillInput};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

/// Raw form payload for bill creation and editing. Numeric fields arrive as
/// strings from the form and are parsed during conversion so malformed
/// input is rejected before any store write.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BillForm {
    #[validate(length(min = 1, message = "customer_id is required"))]
    pub customer_id: String,
    #[validate(length(min = 1, message = "customer_name is required"))]
    pub customer_name: String,
    pub phone: Option<String>,
    #[validate(length(min = 1, message = "tree_id is required"))]
    pub tree_id: String,
    #[validate(length(min = 1, message = "tree_measurement is required"))]
    pub tree_measurement: String,
    pub tree_quantity: Option<String>,
    pub total_amount: String,
    pub amount_paid: String,
}

impl BillForm {
    pub fn into_input(self) -> Result<BillInput, AppError> {
        let form = self.trimmed();
        form.validate()?;

        let total_amount = parse_amount(&form.total_amount, "total_amount")?;
        let amount_paid = parse_amount(&form.amount_paid, "amount_paid")?;
        let tree_quantity = parse_quantity(form.tree_quantity.as_deref())?;

        Ok(BillInput {
            customer_id: form.customer_id,
            customer_name: form.customer_name,
            phone: form.phone.filter(|p| !p.is_empty()),
            tree_id: form.tree_id,
            tree_measurement: form.tree_measurement,
            tree_quantity,
            total_amount,
            amount_paid,
        })
    }

    fn trimmed(self) -> Self {
        Self {
            customer_id: self.customer_id.trim().to_string(),
            customer_name: self.customer_name.trim().to_string(),
            phone: self.phone.map(|p| p.trim().to_string()),
            tree_id: self.tree_id.trim().to_string(),
            tree_measurement: self.tree_measurement.trim().to_string(),
            tree_quantity: self.tree_quantity.map(|q| q.trim().to_string()),
            total_amount: self.total_amount.trim().to_string(),
            amount_paid: self.amount_paid.trim().to_string(),
        }
    }
}

fn parse_amount(raw: &str, field: &str) -> Result<f64, AppError> {
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
        .ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!(
                "{field} must be a non-negative number, got '{raw}'"
            ))
        })
}

fn parse_quantity(raw: Option<&str>) -> Result<u32, AppError> {
    match raw {
        // Absent or blank defaults to a single tree.
        None | Some("") => Ok(1),
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|quantity| *quantity >= 1)
            .ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!(
                    "tree_quantity must be a positive integer, got '{raw}'"
                ))
            }),
    }
}

/// Bill as returned by the JSON endpoints, with timestamps rendered for
/// display instead of raw store datetimes.
#[derive(Debug, Clone, Serialize)]
pub struct BillResponse {
    pub bill_id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub phone: Option<String>,
    pub tree_id: String,
    pub tree_measurement: String,
    pub tree_quantity: u32,
    pub total_amount: f64,
    pub amount_paid: f64,
    pub balance: f64,
    pub status: &'static str,
    /// `dd/mm/yyyy` in the configured display timezone.
    pub date: String,
    pub created_at: String,
    pub last_edited: Option<String>,
}

impl BillResponse {
    pub fn from_bill(bill: &Bill, tz: FixedOffset) -> Self {
        Self {
            bill_id: bill.bill_id.clone(),
            customer_id: bill.customer_id.clone(),
            customer_name: bill.customer_name.clone(),
            phone: bill.phone.clone(),
            tree_id: bill.tree_id.clone(),
            tree_measurement: bill.tree_measurement.clone(),
            tree_quantity: bill.tree_quantity,
            total_amount: bill.total_amount,
            amount_paid: bill.amount_paid,
            balance: bill.balance,
            status: bill.status.as_str(),
            date: display_date(bill.created_at, tz),
            created_at: bill.created_at.to_rfc3339(),
            last_edited: bill.last_edited.map(|t| t.to_chrono().to_rfc3339()),
        }
    }
}

/// Render a timestamp as `dd/mm/yyyy` in the display timezone.
pub fn display_date(ts: DateTime<Utc>, tz: FixedOffset) -> String {
    ts.with_timezone(&tz).format("%d/%m/%Y").to_string()
}
