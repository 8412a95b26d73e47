//! Dev-mode event delivery through the in-process runtime.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use gymjobs_core::{FunctionId, JobEvent};

use crate::app::{AppState, dto, errors};

pub async fn send_event(
    Extension(state): Extension<Arc<AppState>>,
    body: Result<Json<dto::SendEventRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::bad_request(rejection.body_text()),
    };
    if req.name.trim().is_empty() {
        return errors::bad_request("event name must not be empty");
    }

    let event = JobEvent::new(req.name, req.data);
    let event_id = event.id;
    tracing::info!(event = %event.name, %event_id, "event received");

    let runs = state.runtime.send(event).await;

    (
        StatusCode::OK,
        Json(json!({
            "event_id": event_id,
            "runs": runs,
        })),
    )
        .into_response()
}

/// Fire a cron function now instead of waiting for its schedule.
pub async fn tick(
    Extension(state): Extension<Arc<AppState>>,
    Path(function_id): Path<String>,
) -> axum::response::Response {
    let Ok(id) = FunctionId::new(function_id.as_str()) else {
        return errors::unknown_function(&function_id);
    };

    match state.runtime.tick(&id).await {
        Some(report) => (StatusCode::OK, Json(json!({ "run": report }))).into_response(),
        None => errors::unknown_function(&function_id),
    }
}
