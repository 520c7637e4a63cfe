//! service-core: shared infrastructure for the billing workspace.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
