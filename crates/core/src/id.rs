//! Strongly-typed identifiers.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConfigError;

/// Identifier of a single run of a job function.
///
/// A run spans every attempt the runtime makes for one triggering event.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

/// Identifier of an event delivered to the job runtime.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

macro_rules! impl_uuid_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl FromStr for $t {
            type Err = ConfigError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| ConfigError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(RunId, "RunId");
impl_uuid_newtype!(EventId, "EventId");

const MAX_FUNCTION_ID_LEN: usize = 128;

/// Stable identifier of a job function (e.g. `send-welcome-email`).
///
/// The runtime addresses functions by this id across deploys, so it is
/// restricted to lowercase ASCII letters, digits, `-`, `_` and `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FunctionId(String);

impl FunctionId {
    pub fn new(id: impl Into<String>) -> Result<Self, ConfigError> {
        let id = id.into();
        let reject = |reason| ConfigError::InvalidFunctionId {
            id: id.clone(),
            reason,
        };

        if id.is_empty() {
            return Err(reject("must not be empty"));
        }
        if id.len() > MAX_FUNCTION_ID_LEN {
            return Err(reject("must be at most 128 characters"));
        }
        if id.starts_with('-') || id.starts_with('.') {
            return Err(reject("must not start with `-` or `.`"));
        }
        if !id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'-' | b'_' | b'.'))
        {
            return Err(reject("only lowercase letters, digits, `-`, `_` and `.` are allowed"));
        }

        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for FunctionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for FunctionId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for FunctionId {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FunctionId> for String {
    fn from(value: FunctionId) -> Self {
        value.0
    }
}

impl AsRef<str> for FunctionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_slug_ids() {
        for id in ["send-welcome-email", "membership.expiry_sweep", "a", "job-42"] {
            assert!(FunctionId::new(id).is_ok(), "{id} should be accepted");
        }
    }

    #[test]
    fn rejects_malformed_ids() {
        for id in ["", "Send", "has space", "-leading", ".hidden", "slash/id"] {
            assert!(
                matches!(FunctionId::new(id), Err(ConfigError::InvalidFunctionId { .. })),
                "{id:?} should be rejected"
            );
        }

        let too_long = "x".repeat(MAX_FUNCTION_ID_LEN + 1);
        assert!(FunctionId::new(too_long).is_err());
    }

    #[test]
    fn function_id_deserialization_validates() {
        let ok: FunctionId = serde_json::from_str("\"nightly-sweep\"").unwrap();
        assert_eq!(ok.as_str(), "nightly-sweep");

        let bad = serde_json::from_str::<FunctionId>("\"Nightly Sweep\"");
        assert!(bad.is_err());
    }

    #[test]
    fn run_id_parses_from_display() {
        let id = RunId::new();
        let parsed: RunId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<RunId>().is_err());
    }
}
