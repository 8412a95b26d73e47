//! Cron expression validation.
//!
//! The runtime owns scheduling; this module only rejects expressions the
//! runtime would refuse, so that a bad schedule fails at bootstrap instead of
//! at deploy sync.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const MONTH_NAMES: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];
const WEEKDAY_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

#[derive(Debug, Copy, Clone)]
struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
    names: &'static [&'static str],
    /// Value of the first entry in `names`.
    names_base: u32,
}

const FIELDS: [FieldSpec; 5] = [
    FieldSpec { name: "minute", min: 0, max: 59, names: &[], names_base: 0 },
    FieldSpec { name: "hour", min: 0, max: 23, names: &[], names_base: 0 },
    FieldSpec { name: "day-of-month", min: 1, max: 31, names: &[], names_base: 0 },
    FieldSpec { name: "month", min: 1, max: 12, names: &MONTH_NAMES, names_base: 1 },
    FieldSpec { name: "day-of-week", min: 0, max: 7, names: &WEEKDAY_NAMES, names_base: 0 },
];

/// A validated five-field cron schedule with an optional `TZ=` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CronSchedule {
    timezone: Option<String>,
    fields: [String; 5],
}

impl CronSchedule {
    pub fn parse(expr: &str) -> Result<Self, ConfigError> {
        let mut parts = expr.split_whitespace().peekable();

        let timezone = match parts.peek() {
            Some(first) if first.starts_with("TZ=") || first.starts_with("CRON_TZ=") => {
                let zone = first.split_once('=').map(|(_, z)| z).unwrap_or_default();
                if zone.is_empty() {
                    return Err(ConfigError::invalid_cron(expr, "empty timezone"));
                }
                let zone = zone.to_string();
                parts.next();
                Some(zone)
            }
            _ => None,
        };

        let raw: Vec<&str> = parts.collect();
        if raw.len() != FIELDS.len() {
            return Err(ConfigError::invalid_cron(
                expr,
                format!("expected 5 fields, found {}", raw.len()),
            ));
        }

        for (field, spec) in raw.iter().zip(FIELDS.iter()) {
            validate_field(field, spec).map_err(|reason| ConfigError::invalid_cron(expr, reason))?;
        }

        let fields = [
            raw[0].to_string(),
            raw[1].to_string(),
            raw[2].to_string(),
            raw[3].to_string(),
            raw[4].to_string(),
        ];

        Ok(Self { timezone, fields })
    }

    pub fn timezone(&self) -> Option<&str> {
        self.timezone.as_deref()
    }

    pub fn fields(&self) -> &[String; 5] {
        &self.fields
    }
}

fn validate_field(field: &str, spec: &FieldSpec) -> Result<(), String> {
    for item in field.split(',') {
        if item.is_empty() {
            return Err(format!("{}: empty list item", spec.name));
        }

        let (range, step) = match item.split_once('/') {
            Some((range, step)) => (range, Some(step)),
            None => (item, None),
        };

        if let Some(step) = step {
            let step: u32 = step
                .parse()
                .map_err(|_| format!("{}: invalid step `{step}`", spec.name))?;
            if step == 0 || step > spec.max {
                return Err(format!("{}: step must be between 1 and {}", spec.name, spec.max));
            }
        }

        if range == "*" {
            continue;
        }

        match range.split_once('-') {
            Some((lo, hi)) => {
                let lo = parse_value(lo, spec)?;
                let hi = parse_value(hi, spec)?;
                if lo > hi {
                    return Err(format!("{}: range {lo}-{hi} is reversed", spec.name));
                }
            }
            None => {
                parse_value(range, spec)?;
            }
        }
    }
    Ok(())
}

fn parse_value(token: &str, spec: &FieldSpec) -> Result<u32, String> {
    let upper = token.to_ascii_uppercase();
    if let Some(index) = spec.names.iter().position(|n| *n == upper) {
        return Ok(spec.names_base + index as u32);
    }

    let value: u32 = token
        .parse()
        .map_err(|_| format!("{}: invalid value `{token}`", spec.name))?;
    if value < spec.min || value > spec.max {
        return Err(format!(
            "{}: {value} outside {}-{}",
            spec.name, spec.min, spec.max
        ));
    }
    Ok(value)
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tz) = &self.timezone {
            write!(f, "TZ={tz} ")?;
        }
        f.write_str(&self.fields.join(" "))
    }
}

impl TryFrom<String> for CronSchedule {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CronSchedule> for String {
    fn from(value: CronSchedule) -> Self {
        value.to_string()
    }
}
