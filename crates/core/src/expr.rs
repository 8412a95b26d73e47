//! Small expression forms over event payloads.
//!
//! Rate-limit keys are bare paths (`event.data.member_id`). Trigger filters
//! are `&&`-joined comparisons of a path with a JSON literal:
//!
//! ```text
//! event.data.plan == "pro" && event.data.trial != true
//! ```

use core::fmt;

use serde_json::Value;

use crate::error::ConfigError;

const PATH_PREFIX: &str = "event.data.";

static NULL: Value = Value::Null;

/// A dotted path into `event.data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPath {
    segments: Vec<String>,
}

impl DataPath {
    pub fn parse(expr: &str) -> Result<Self, ConfigError> {
        let trimmed = expr.trim();
        let rest = trimmed.strip_prefix(PATH_PREFIX).ok_or_else(|| {
            ConfigError::invalid_expression(expr, "must start with `event.data.`")
        })?;

        let segments: Vec<String> = rest.split('.').map(str::to_string).collect();
        for segment in &segments {
            let valid = !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(ConfigError::invalid_expression(
                    expr,
                    format!("invalid path segment `{segment}`"),
                ));
            }
        }

        Ok(Self { segments })
    }

    /// Resolve the path against an event payload.
    ///
    /// Numeric segments index into arrays.
    pub fn resolve<'a>(&self, data: &'a Value) -> Option<&'a Value> {
        self.segments.iter().try_fold(data, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", PATH_PREFIX, self.segments.join("."))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub path: DataPath,
    pub op: CompareOp,
    pub value: Value,
}

impl Condition {
    fn matches(&self, data: &Value) -> bool {
        let found = self.path.resolve(data).unwrap_or(&NULL);
        match self.op {
            CompareOp::Eq => values_equal(found, &self.value),
            CompareOp::Ne => !values_equal(found, &self.value),
        }
    }
}

/// Numbers compare by value so that `1` matches `1.0`; two integers compare
/// exactly.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x == y
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                x == y
            } else if x.is_f64() || y.is_f64() {
                x.as_f64() == y.as_f64()
            } else {
                // One side is negative, the other above `i64::MAX`.
                false
            }
        }
        _ => a == b,
    }
}

/// A conjunction of comparisons evaluated against `event.data`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn parse(expr: &str) -> Result<Self, ConfigError> {
        let mut parser = FilterParser { src: expr, pos: 0 };
        let mut conditions = Vec::new();

        loop {
            conditions.push(parser.condition()?);
            parser.skip_ws();
            if parser.at_end() {
                break;
            }
            if !parser.eat("&&") {
                return Err(parser.error("expected `&&` between comparisons"));
            }
        }

        Ok(Self { conditions })
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn matches(&self, data: &Value) -> bool {
        self.conditions.iter().all(|c| c.matches(data))
    }
}

struct FilterParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> FilterParser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn error(&self, reason: &str) -> ConfigError {
        ConfigError::invalid_expression(self.src, format!("{reason} at offset {}", self.pos))
    }

    fn condition(&mut self) -> Result<Condition, ConfigError> {
        self.skip_ws();
        let path_len = self
            .rest()
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(self.rest().len());
        if path_len == 0 {
            return Err(self.error("expected a path"));
        }
        let path = DataPath::parse(&self.rest()[..path_len])
            .map_err(|_| self.error("expected a path starting with `event.data.`"))?;
        self.pos += path_len;

        self.skip_ws();
        let op = if self.eat("==") {
            CompareOp::Eq
        } else if self.eat("!=") {
            CompareOp::Ne
        } else {
            return Err(self.error("expected `==` or `!=`"));
        };

        self.skip_ws();
        let value = self.literal()?;
        Ok(Condition { path, op, value })
    }

    fn literal(&mut self) -> Result<Value, ConfigError> {
        let rest = self.rest();
        let Some(first) = rest.chars().next() else {
            return Err(self.error("expected a literal"));
        };

        if first == '"' || first == '\'' {
            let mut out = String::new();
            let mut escaped = false;
            for (offset, ch) in rest.char_indices().skip(1) {
                if escaped {
                    out.push(ch);
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == first {
                    self.pos += offset + ch.len_utf8();
                    return Ok(Value::String(out));
                } else {
                    out.push(ch);
                }
            }
            return Err(self.error("unterminated string literal"));
        }

        let end = rest
            .find(|c: char| c.is_whitespace() || c == '&')
            .unwrap_or(rest.len());
        let token = &rest[..end];
        let value: Value = serde_json::from_str(token)
            .map_err(|_| self.error("expected a string, number, boolean or null"))?;
        if value.is_array() || value.is_object() {
            return Err(self.error("only scalar literals are supported"));
        }
        self.pos += end;
        Ok(value)
    }
}
