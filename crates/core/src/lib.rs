//! `gymjobs-core`: job description building blocks.
//!
//! This crate contains **pure** types (no runtime, no IO): identifiers, job
//! configuration, triggers, and the events the job runtime delivers.

pub mod config;
pub mod cron;
pub mod error;
pub mod event;
pub mod expr;
pub mod id;
pub mod period;
pub mod trigger;

pub use config::{JobFunctionConfig, PartitionKey, RateLimit, Retries};
pub use cron::CronSchedule;
pub use error::{ConfigError, ConfigResult};
pub use event::JobEvent;
pub use expr::{DataPath, Filter};
pub use id::{EventId, FunctionId, RunId};
pub use period::Period;
pub use trigger::{EventName, SCHEDULED_TIMER_EVENT, TriggerSpec};
