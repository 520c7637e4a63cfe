//! Home page and helpers shared by the page handlers.

use askama::Template;
use axum::extract::Query;
use axum::response::{IntoResponse, Redirect};
use serde::Deserialize;

/// Optional one-shot notice carried across redirects, the equivalent of a
/// flash message.
#[derive(Debug, Deserialize)]
pub struct NoticeParams {
    pub notice: Option<String>,
}

/// Redirect to `path` with a human-readable notice in the query string.
pub(crate) fn redirect_with_notice(path: &str, notice: &str) -> Redirect {
    match serde_urlencoded::to_string([("notice", notice)]) {
        Ok(query) => Redirect::to(&format!("{path}?{query}")),
        Err(_) => Redirect::to(path),
    }
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub notice: Option<String>,
}

pub async fn home(Query(params): Query<NoticeParams>) -> impl IntoResponse {
    HomeTemplate {
        notice: params.notice,
    }
}
