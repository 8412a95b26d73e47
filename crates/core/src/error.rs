//! Configuration error model.

use thiserror::Error;

/// Result type used by the configuration and trigger types.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A job description failed validation.
///
/// These are deterministic failures in what the caller described; runtime and
/// business failures are reported elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A function identifier was malformed.
    #[error("invalid function id `{id}`: {reason}")]
    InvalidFunctionId { id: String, reason: &'static str },

    /// Retry count outside the runtime's accepted range.
    #[error("retries must be between 0 and {max}, got {got}")]
    RetriesOutOfRange { got: u32, max: u8 },

    /// Concurrency limit of zero (use `None` for unlimited).
    #[error("concurrency limit must be at least 1")]
    ZeroConcurrency,

    /// Rate limit of zero events per period.
    #[error("rate limit must allow at least 1 event per period")]
    ZeroRateLimit,

    /// A duration string could not be parsed or is out of range.
    #[error("invalid period `{input}`: {reason}")]
    InvalidPeriod { input: String, reason: String },

    /// An event name was empty or malformed.
    #[error("invalid event name `{0}`")]
    InvalidEventName(String),

    /// A cron expression was malformed.
    #[error("invalid cron expression `{expr}`: {reason}")]
    InvalidCron { expr: String, reason: String },

    /// A rate-limit partition key or filter expression was malformed.
    #[error("invalid expression `{expr}`: {reason}")]
    InvalidExpression { expr: String, reason: String },

    /// A serialized config could not be decoded.
    #[error("malformed job config: {0}")]
    Malformed(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl ConfigError {
    pub fn invalid_period(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPeriod {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_cron(expr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCron {
            expr: expr.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_expression(expr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidExpression {
            expr: expr.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
