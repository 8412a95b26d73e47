use axum::{
    Router,
    routing::{get, post},
};

pub mod events;
pub mod functions;
pub mod system;

/// Router for everything under `/api`.
pub fn router() -> Router {
    Router::new()
        .route("/jobs", get(functions::list_functions))
        .route("/jobs/:function_id", post(functions::invoke_function))
        .route("/jobs/:function_id/tick", post(events::tick))
        .route("/events", post(events::send_event))
}
