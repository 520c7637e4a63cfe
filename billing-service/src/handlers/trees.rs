//! Tree inventory: the merged listing page and inventory creation.

use crate::dtos::{display_date, TreeForm};
use crate::handlers::app::{redirect_with_notice, NoticeParams};
use crate::models::TreeView;
use crate::startup::AppState;
use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Form,
};
use chrono::FixedOffset;

pub struct TreeRow {
    pub tree_id: String,
    pub size: String,
    pub description: String,
    pub status: &'static str,
    pub customer_name: String,
    pub bill_id: String,
    pub bill_date: String,
    pub amount: String,
}

impl TreeRow {
    fn from_view(view: &TreeView, tz: FixedOffset) -> Self {
        let (customer_name, bill_id, bill_date, amount) = match &view.sale {
            Some(sale) => (
                sale.customer_name.clone(),
                sale.bill_id.clone(),
                display_date(sale.bill_date, tz),
                format!("{:.2}", sale.amount),
            ),
            None => (String::new(), String::new(), String::new(), String::new()),
        };
        Self {
            tree_id: view.tree_id.clone(),
            size: view.size.clone(),
            description: view.description.clone().unwrap_or_default(),
            status: view.status.as_str(),
            customer_name,
            bill_id,
            bill_date,
            amount,
        }
    }
}

#[derive(Template)]
#[template(path = "trees.html")]
pub struct TreesTemplate {
    pub trees: Vec<TreeRow>,
    pub notice: Option<String>,
}

/// GET /trees: inventory merged with bill-derived sale status.
pub async fn trees_page(
    State(state): State<AppState>,
    Query(params): Query<NoticeParams>,
) -> Response {
    match state.trees.list().await {
        Ok(views) => {
            let trees = views
                .iter()
                .map(|view| TreeRow::from_view(view, state.timezone))
                .collect();
            TreesTemplate {
                trees,
                notice: params.notice,
            }
            .into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to fetch trees");
            redirect_with_notice("/", "Error fetching trees").into_response()
        }
    }
}

/// POST /add_tree: add an inventory tree and bounce back to the listing.
pub async fn add_tree(State(state): State<AppState>, Form(form): Form<TreeForm>) -> Response {
    let input = match form.into_input() {
        Ok(input) => input,
        Err(err) => {
            tracing::warn!(error = %err, "Rejected tree creation");
            return redirect_with_notice("/trees", &format!("Error: {err}")).into_response();
        }
    };

    match state.trees.add(input).await {
        Ok(_) => redirect_with_notice("/trees", "Tree added successfully!").into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Failed to add tree");
            redirect_with_notice("/trees", "Error adding tree").into_response()
        }
    }
}
