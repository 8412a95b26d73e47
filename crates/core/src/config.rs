//! Job function configuration.

use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::expr::DataPath;
use crate::id::FunctionId;
use crate::period::Period;

/// Identity and flow-control settings of one job function.
///
/// Every field is a validated type, so a value of this struct is always
/// acceptable to the runtime. Builders take ownership of it; there is no way
/// to change a config once a job has been described.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFunctionConfig {
    pub id: FunctionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Maximum concurrent runs; `None` leaves the runtime's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<NonZeroU32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimit>,
    #[serde(default)]
    pub retries: Retries,
}

impl JobFunctionConfig {
    pub fn new(id: impl Into<String>) -> ConfigResult<Self> {
        Ok(Self {
            id: FunctionId::new(id)?,
            name: None,
            concurrency: None,
            rate_limit: None,
            retries: Retries::default(),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_concurrency(mut self, limit: u32) -> ConfigResult<Self> {
        self.concurrency = Some(NonZeroU32::new(limit).ok_or(ConfigError::ZeroConcurrency)?);
        Ok(self)
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimit) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> ConfigResult<Self> {
        self.retries = Retries::new(retries)?;
        Ok(self)
    }

    /// Human-readable name, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }

    /// Parse a config from JSON, validating every field.
    pub fn from_json(value: serde_json::Value) -> ConfigResult<Self> {
        serde_json::from_value(value).map_err(|e| ConfigError::Malformed(e.to_string()))
    }
}

/// Cap on how many runs start per `period`, optionally per partition key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub limit: NonZeroU32,
    pub period: Period,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<PartitionKey>,
}

impl RateLimit {
    pub fn new(limit: u32, period: &str) -> ConfigResult<Self> {
        Ok(Self {
            limit: NonZeroU32::new(limit).ok_or(ConfigError::ZeroRateLimit)?,
            period: Period::parse(period)?,
            key: None,
        })
    }

    pub fn keyed_by(mut self, expr: &str) -> ConfigResult<Self> {
        self.key = Some(PartitionKey::parse(expr)?);
        Ok(self)
    }
}

/// Expression selecting the rate-limit partition (`event.data.member_id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartitionKey(DataPath);

impl PartitionKey {
    pub fn parse(expr: &str) -> ConfigResult<Self> {
        Ok(Self(DataPath::parse(expr)?))
    }

    pub fn path(&self) -> &DataPath {
        &self.0
    }
}

impl TryFrom<String> for PartitionKey {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PartitionKey> for String {
    fn from(value: PartitionKey) -> Self {
        value.0.to_string()
    }
}

/// Number of retries after the first attempt, bounded to `0..=20`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Retries(u8);

impl Retries {
    pub const MAX: u8 = 20;
    pub const DEFAULT: u8 = 4;

    pub fn new(retries: u32) -> ConfigResult<Self> {
        if retries > u32::from(Self::MAX) {
            return Err(ConfigError::RetriesOutOfRange {
                got: retries,
                max: Self::MAX,
            });
        }
        Ok(Self(retries as u8))
    }

    pub fn none() -> Self {
        Self(0)
    }

    pub fn get(&self) -> u32 {
        u32::from(self.0)
    }

    /// Total attempts the runtime makes: the first one plus every retry.
    pub fn max_attempts(&self) -> u32 {
        self.get() + 1
    }
}

impl Default for Retries {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<u32> for Retries {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Retries> for u32 {
    fn from(value: Retries) -> Self {
        value.get()
    }
}
