//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store and kill coordinator wiring (in-memory or Postgres)
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: response DTOs
//! - `errors.rs`: consistent error responses and path parsing

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: Arc<services::AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_logging))
                .layer(Extension(services)),
        )
}
