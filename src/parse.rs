//! Value Parsing - Strict Conversions for Configuration Values
//!
//! Configuration documents carry numbers, tuples and flags either as native
//! values or as strings (`"(10, -5)"`, `"1.5"`, `"true"`). Nothing here
//! evaluates expressions; anything that is not a plain number is rejected.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::ConfigError;

/// A 2D point or offset
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, other: Point) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl<'de> Deserialize<'de> for Point {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        parse_point("point", &value).map_err(serde::de::Error::custom)
    }
}

fn invalid(field: &str, value: &Value, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number_str(field: &str, raw: &str, value: &Value) -> Result<f64, ConfigError> {
    let parsed: f64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid(field, value, "expected a number"))?;
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(invalid(field, value, "number must be finite"))
    }
}

/// Parse a float from a number or numeric string
pub fn parse_float(field: &str, value: &Value) -> Result<f64, ConfigError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| invalid(field, value, "number out of range")),
        Value::String(s) => parse_number_str(field, s, value),
        _ => Err(invalid(field, value, "expected a number")),
    }
}

/// Parse a 2-tuple of floats.
///
/// Accepts `[x, y]`, `"(x, y)"`, `"[x, y]"` and `"x, y"`.
pub fn parse_point(field: &str, value: &Value) -> Result<Point, ConfigError> {
    let parts: Vec<f64> = match value {
        Value::Array(items) => items
            .iter()
            .map(|item| parse_float(field, item))
            .collect::<Result<_, _>>()?,
        Value::String(s) => {
            let trimmed = s.trim();
            let inner = trimmed
                .strip_prefix('(')
                .and_then(|rest| rest.strip_suffix(')'))
                .or_else(|| {
                    trimmed
                        .strip_prefix('[')
                        .and_then(|rest| rest.strip_suffix(']'))
                })
                .unwrap_or(trimmed);
            inner
                .split(',')
                .map(|part| parse_number_str(field, part, value))
                .collect::<Result<_, _>>()?
        }
        _ => return Err(invalid(field, value, "expected a 2-tuple")),
    };

    match parts.as_slice() {
        [x, y] => Ok(Point::new(*x, *y)),
        _ => Err(invalid(field, value, "expected exactly two components")),
    }
}

/// Parse a flag from a bool or a `true`/`false`/`yes`/`no` string
pub fn parse_bool(field: &str, value: &Value) -> Result<bool, ConfigError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Ok(true),
            "false" | "no" => Ok(false),
            _ => Err(invalid(field, value, "expected a boolean")),
        },
        _ => Err(invalid(field, value, "expected a boolean")),
    }
}
