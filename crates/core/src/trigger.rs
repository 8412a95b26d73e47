//! What makes a job function run: an event subscription or a schedule.

use serde::{Deserialize, Serialize};

use crate::cron::CronSchedule;
use crate::error::ConfigError;

/// Event name delivered to cron-triggered functions.
pub const SCHEDULED_TIMER_EVENT: &str = "inngest/scheduled.timer";

/// Trigger of a job function. Exactly one variant is active per job.
///
/// Serialises to the runtime's wire shape: `{"event": ..., "if": ...}` or
/// `{"cron": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TriggerSpec {
    Event {
        event: EventName,
        #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
        condition: Option<String>,
    },
    Cron {
        cron: CronSchedule,
    },
}

impl TriggerSpec {
    pub fn event(name: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self::Event {
            event: EventName::new(name)?,
            condition: None,
        })
    }

    pub fn event_if(
        name: impl Into<String>,
        condition: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::Event {
            event: EventName::new(name)?,
            condition: Some(condition.into()),
        })
    }

    pub fn cron(expr: &str) -> Result<Self, ConfigError> {
        Ok(Self::Cron {
            cron: CronSchedule::parse(expr)?,
        })
    }

    pub fn event_name(&self) -> Option<&EventName> {
        match self {
            TriggerSpec::Event { event, .. } => Some(event),
            TriggerSpec::Cron { .. } => None,
        }
    }

    pub fn condition(&self) -> Option<&str> {
        match self {
            TriggerSpec::Event { condition, .. } => condition.as_deref(),
            TriggerSpec::Cron { .. } => None,
        }
    }

    pub fn is_cron(&self) -> bool {
        matches!(self, TriggerSpec::Cron { .. })
    }
}

/// Name of an event (e.g. `user.created`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventName(String);

impl EventName {
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidEventName(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for EventName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EventName {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EventName> for String {
    fn from(value: EventName) -> Self {
        value.0
    }
}

impl PartialEq<str> for EventName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}
