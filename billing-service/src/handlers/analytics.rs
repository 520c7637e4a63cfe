//! Revenue analytics, exposed once as a page and once as JSON. Both are
//! computed by the same bucketing pass so their numbers always agree.

use crate::handlers::app::redirect_with_notice;
use crate::services::{bucket_revenue, RevenueBuckets};
use crate::startup::AppState;
use askama::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::AppError;
use std::collections::BTreeMap;

#[derive(Template)]
#[template(path = "analytics.html")]
pub struct AnalyticsTemplate {
    pub daily: Vec<(String, String)>,
    pub weekly: Vec<(String, String)>,
    pub monthly: Vec<(String, String)>,
}

fn display_rows(buckets: &BTreeMap<String, f64>) -> Vec<(String, String)> {
    buckets
        .iter()
        .map(|(key, total)| (key.clone(), format!("{total:.2}")))
        .collect()
}

/// GET /analytics: the HTML view.
pub async fn analytics_page(State(state): State<AppState>) -> Response {
    match compute(&state).await {
        Ok(buckets) => AnalyticsTemplate {
            daily: display_rows(&buckets.daily),
            weekly: display_rows(&buckets.weekly),
            monthly: display_rows(&buckets.monthly),
        }
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Failed to compute analytics");
            redirect_with_notice("/", "Error fetching analytics data").into_response()
        }
    }
}

/// GET /api/analytics: the same buckets as JSON.
pub async fn analytics_api(
    State(state): State<AppState>,
) -> Result<Json<RevenueBuckets>, AppError> {
    Ok(Json(compute(&state).await?))
}

async fn compute(state: &AppState) -> Result<RevenueBuckets, AppError> {
    let bills = state.bills.all().await?;
    Ok(bucket_revenue(&bills, state.timezone))
}
