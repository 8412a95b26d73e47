//! Duration strings used by rate limits (`"30s"`, `"1h30m"`).

use core::fmt;
use core::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const MIN_PERIOD: Duration = Duration::from_secs(1);
const MAX_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// A rate-limit window, written as concatenated `<n><unit>` terms.
///
/// Units are `s`, `m`, `h` and `d`. The runtime accepts windows between one
/// second and 24 hours.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period(Duration);

impl Period {
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::invalid_period(input, "empty"));
        }

        let mut total: u64 = 0;
        let mut digits = String::new();

        for ch in trimmed.chars() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                continue;
            }

            let unit_secs = match ch {
                's' => 1,
                'm' => 60,
                'h' => 60 * 60,
                'd' => 24 * 60 * 60,
                other => {
                    return Err(ConfigError::invalid_period(
                        input,
                        format!("unknown unit `{other}`"),
                    ));
                }
            };

            if digits.is_empty() {
                return Err(ConfigError::invalid_period(
                    input,
                    format!("unit `{ch}` has no amount"),
                ));
            }
            let amount: u64 = digits
                .parse()
                .map_err(|_| ConfigError::invalid_period(input, "amount too large"))?;
            digits.clear();

            total = amount
                .checked_mul(unit_secs)
                .and_then(|secs| total.checked_add(secs))
                .ok_or_else(|| ConfigError::invalid_period(input, "amount too large"))?;
        }

        if !digits.is_empty() {
            return Err(ConfigError::invalid_period(input, "trailing amount without unit"));
        }

        Self::from_duration(Duration::from_secs(total))
            .map_err(|_| ConfigError::invalid_period(input, "must be between 1s and 24h"))
    }

    /// Wrap an exact duration; whole seconds within 1s..=24h only.
    pub fn from_duration(duration: Duration) -> Result<Self, ConfigError> {
        if duration.subsec_nanos() != 0 {
            return Err(ConfigError::invalid_period(
                format!("{duration:?}"),
                "sub-second precision is not supported",
            ));
        }
        if duration < MIN_PERIOD || duration > MAX_PERIOD {
            return Err(ConfigError::invalid_period(
                format!("{duration:?}"),
                "must be between 1s and 24h",
            ));
        }
        Ok(Self(duration))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut secs = self.0.as_secs();
        for (unit, size) in [('d', 86_400), ('h', 3_600), ('m', 60), ('s', 1)] {
            if secs >= size {
                write!(f, "{}{}", secs / size, unit)?;
                secs %= size;
            }
        }
        Ok(())
    }
}

impl FromStr for Period {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Period {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_and_compound_terms() {
        assert_eq!(Period::parse("30s").unwrap().as_duration(), Duration::from_secs(30));
        assert_eq!(Period::parse("1m").unwrap().as_duration(), Duration::from_secs(60));
        assert_eq!(
            Period::parse("1h30m").unwrap().as_duration(),
            Duration::from_secs(5_400)
        );
        assert_eq!(
            Period::parse("1d").unwrap().as_duration(),
            Duration::from_secs(86_400)
        );
    }

    #[test]
    fn displays_canonical_form() {
        assert_eq!(Period::parse("90m").unwrap().to_string(), "1h30m");
        assert_eq!(Period::parse("60s").unwrap().to_string(), "1m");
        assert_eq!(Period::parse("24h").unwrap().to_string(), "1d");
    }

    #[test]
    fn rejects_malformed_and_out_of_range() {
        for input in ["", "10", "m", "5x", "0s", "25h", "2d", "1h-5m"] {
            assert!(Period::parse(input).is_err(), "{input:?} should be rejected");
        }
    }

    #[test]
    fn serde_uses_string_form() {
        let p: Period = serde_json::from_str("\"2h\"").unwrap();
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"2h\"");
        assert!(serde_json::from_str::<Period>("\"forever\"").is_err());
    }
}
