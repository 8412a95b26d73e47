//! Introspection and invocation of registered functions.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use gymjobs_core::FunctionId;
use gymjobs_functions::{Invocation, MemoStep};

use crate::app::{AppState, dto, errors};

pub async fn list_functions(Extension(state): Extension<Arc<AppState>>) -> axum::response::Response {
    let functions = state
        .registry
        .iter()
        .map(dto::function_to_json)
        .collect::<Vec<_>>();

    (
        StatusCode::OK,
        Json(json!({
            "app_id": state.app_id,
            "count": state.registry.count(),
            "functions": functions,
        })),
    )
        .into_response()
}

/// Run one attempt of a function. The caller owns retries and passes back
/// the `steps` map between attempts.
pub async fn invoke_function(
    Extension(state): Extension<Arc<AppState>>,
    Path(function_id): Path<String>,
    body: Result<Json<dto::InvokeRequest>, JsonRejection>,
) -> axum::response::Response {
    let Some(function) = FunctionId::new(function_id.as_str())
        .ok()
        .and_then(|id| state.registry.get(&id).cloned())
    else {
        return errors::unknown_function(&function_id);
    };

    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::bad_request(rejection.body_text()),
    };

    let step = Arc::new(MemoStep::with_completed(req.steps));
    let invocation = Invocation {
        event: req.event,
        step: step.clone(),
        run_id: req.run_id.unwrap_or_default(),
        attempt: req.attempt.unwrap_or(0),
    };
    let run_id = invocation.run_id;

    match function.invoke(invocation).await {
        Ok(output) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "run_id": run_id,
                "output": output,
                "steps": step.completed(),
            })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "error",
                "run_id": run_id,
                "message": format!("{err:#}"),
                "steps": step.completed(),
            })),
        )
            .into_response(),
    }
}
