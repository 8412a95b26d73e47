//! HTTP application wiring (Axum router + shared state).
//!
//! - `routes/`: handlers, one file per area
//! - `dto.rs`: request bodies and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use gymjobs_functions::{FunctionRegistry, InProcessRuntime};

use crate::bootstrap::Bootstrapped;

pub mod dto;
pub mod errors;
pub mod routes;

/// Read-only state shared by every handler once serving starts.
pub struct AppState {
    pub app_id: String,
    pub registry: Arc<FunctionRegistry>,
    pub runtime: Arc<InProcessRuntime>,
}

impl AppState {
    pub fn new(app_id: impl Into<String>, booted: Bootstrapped) -> Self {
        Self {
            app_id: app_id.into(),
            registry: Arc::new(booted.registry),
            runtime: booted.runtime,
        }
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", routes::router())
        .layer(ServiceBuilder::new().layer(Extension(Arc::new(state))))
}
