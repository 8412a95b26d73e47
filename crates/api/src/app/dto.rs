use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Value, json};

use gymjobs_core::{JobEvent, RunId, TriggerSpec};
use gymjobs_functions::RegisteredFunction;

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /api/jobs/:function_id`: one attempt of one run.
#[derive(Debug, Deserialize)]
pub struct InvokeRequest {
    pub event: JobEvent,
    #[serde(default)]
    pub run_id: Option<RunId>,
    #[serde(default)]
    pub attempt: Option<u32>,
    /// Outputs of steps completed by earlier attempts.
    #[serde(default)]
    pub steps: HashMap<String, Value>,
}

/// Body of `POST /api/events`.
#[derive(Debug, Deserialize)]
pub struct SendEventRequest {
    pub name: String,
    #[serde(default)]
    pub data: Value,
}

// -------------------------
// Response mapping
// -------------------------

pub fn trigger_to_json(trigger: &TriggerSpec) -> Value {
    match trigger {
        TriggerSpec::Event { event, condition } => json!({
            "kind": "event",
            "event": event.as_str(),
            "if": condition,
        }),
        TriggerSpec::Cron { cron } => json!({
            "kind": "cron",
            "cron": cron.to_string(),
        }),
    }
}

pub fn function_to_json(function: &RegisteredFunction) -> Value {
    let config = function.config();
    json!({
        "id": function.id().as_str(),
        "name": config.display_name(),
        "handle": function.handle(),
        "trigger": trigger_to_json(function.trigger()),
        "concurrency": config.concurrency.map(|limit| limit.get()),
        "retries": config.retries.get(),
        "rate_limit": config.rate_limit.as_ref().map(|limit| json!({
            "limit": limit.limit.get(),
            "period": limit.period.to_string(),
            "key": limit.key.as_ref().map(|key| key.path().to_string()),
        })),
    })
}
