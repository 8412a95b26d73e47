//! Events delivered by the job runtime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::id::EventId;
use crate::trigger::SCHEDULED_TIMER_EVENT;

/// An event as the runtime delivers it to a function.
///
/// `data` stays untyped here; each job decodes it into its own payload type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEvent {
    pub name: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default = "EventId::new")]
    pub id: EventId,
    #[serde(default = "Utc::now")]
    pub ts: DateTime<Utc>,
}

impl JobEvent {
    pub fn new(name: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            data,
            id: EventId::new(),
            ts: Utc::now(),
        }
    }

    /// The synthetic event the runtime sends to cron-triggered functions.
    pub fn scheduled_timer(cron: &str) -> Self {
        Self::new(SCHEDULED_TIMER_EVENT, serde_json::json!({ "cron": cron }))
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data)
    }
}
