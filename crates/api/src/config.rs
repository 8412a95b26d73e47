//! Process configuration read from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use gymjobs_observability::LogFormat;

/// A variable was set but could not be parsed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigLoadError {
    #[error("{var} is not a valid socket address: `{value}`")]
    InvalidAddr { var: &'static str, value: String },

    #[error("{var} must be a whole number of milliseconds, got `{value}`")]
    InvalidMillis { var: &'static str, value: String },

    #[error("{var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Settings of the serving binary.
#[derive(Debug, Clone, PartialEq)]
pub struct ServeConfig {
    /// Application id functions are grouped under.
    pub app_id: String,
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
    /// Base delay of the in-process runtime's retry backoff.
    pub retry_base: Duration,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            app_id: "gym-app".to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_format: LogFormat::Json,
            retry_base: Duration::from_millis(500),
        }
    }
}

impl ServeConfig {
    pub const APP_ID: &'static str = "GYMJOBS_APP_ID";
    pub const BIND_ADDR: &'static str = "GYMJOBS_BIND_ADDR";
    pub const LOG_FORMAT: &'static str = LogFormat::ENV;
    pub const RETRY_BASE_MS: &'static str = "GYMJOBS_RETRY_BASE_MS";

    pub fn from_env() -> Result<Self, ConfigLoadError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Only the log format, so tracing can be set up before the rest of the
    /// configuration (and its fallback warnings) is read.
    pub fn log_format_from(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<LogFormat, ConfigLoadError> {
        match lookup(Self::LOG_FORMAT) {
            Some(raw) => raw.parse().map_err(|reason| ConfigLoadError::Invalid {
                var: Self::LOG_FORMAT,
                reason,
            }),
            None => Ok(Self::default().log_format),
        }
    }

    /// Build from any variable source. Unset variables fall back to the
    /// defaults; set but malformed ones are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigLoadError> {
        let defaults = Self::default();

        let app_id = match lookup(Self::APP_ID) {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => {
                tracing::warn!("{} not set; using `{}`", Self::APP_ID, defaults.app_id);
                defaults.app_id
            }
        };

        let bind_addr = match lookup(Self::BIND_ADDR) {
            Some(raw) => raw.parse().map_err(|_| ConfigLoadError::InvalidAddr {
                var: Self::BIND_ADDR,
                value: raw,
            })?,
            None => {
                tracing::warn!("{} not set; using {}", Self::BIND_ADDR, defaults.bind_addr);
                defaults.bind_addr
            }
        };

        let log_format = Self::log_format_from(&lookup)?;

        let retry_base = match lookup(Self::RETRY_BASE_MS) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigLoadError::InvalidMillis {
                    var: Self::RETRY_BASE_MS,
                    value: raw,
                })?,
            None => defaults.retry_base,
        };

        Ok(Self {
            app_id,
            bind_addr,
            log_format,
            retry_base,
        })
    }
}
