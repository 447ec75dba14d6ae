//! Type coercion for resolved context values.
//!
//! Environment variables and shell output are always text. The `as` key of a
//! context variable converts that text (or any other resolved value) into the
//! type the template expects.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;

use crate::constants::MAX_VALUE_IN_ERROR;
use crate::core::{EtchError, Result};

/// Target type of a coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoercionKind {
    /// Stringify
    Str,
    /// Parse as a float, then round to the nearest integer
    Int,
    /// Parse as a float
    Float,
    /// `true/1/yes/y` or `false/0/no/n`, case-insensitive
    Bool,
    /// Parse text as JSON; structured values pass through
    Json,
}

impl CoercionKind {
    /// Every accepted name, for error messages.
    pub const NAMES: [&'static str; 5] = ["str", "int", "float", "bool", "json"];

    /// The name used in configuration documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for CoercionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoercionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "str" => Ok(Self::Str),
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "bool" => Ok(Self::Bool),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown coercion type '{other}', 'as' must be one of {}",
                Self::NAMES.join(", ")
            )),
        }
    }
}

/// Text form of a value: strings as-is, everything else as compact JSON.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn failure(value: &Value, kind: CoercionKind, reason: impl Into<String>) -> EtchError {
    let mut shown = stringify(value);
    if shown.chars().count() > MAX_VALUE_IN_ERROR {
        shown = shown.chars().take(MAX_VALUE_IN_ERROR).collect::<String>() + "...";
    }
    EtchError::CoercionFailed {
        value: shown,
        kind: kind.to_string(),
        reason: reason.into(),
    }
}

fn parse_float(value: &Value, kind: CoercionKind) -> Result<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        other => stringify(other).trim().parse::<f64>().ok(),
    };
    match parsed {
        Some(f) if f.is_finite() => Ok(f),
        Some(_) => Err(failure(value, kind, "value is not a finite number")),
        None => Err(failure(value, kind, "value is not a number")),
    }
}

/// Converts `value` to `kind`.
///
/// # Errors
///
/// Returns [`EtchError::CoercionFailed`] naming the raw value and the kind.
///
/// # Examples
///
/// ```rust
/// use etch::config::{CoercionKind, coerce};
/// use serde_json::json;
///
/// assert_eq!(coerce(json!("123.34"), CoercionKind::Int).unwrap(), json!(123));
/// assert_eq!(coerce(json!("Yes"), CoercionKind::Bool).unwrap(), json!(true));
/// assert!(coerce(json!("truee"), CoercionKind::Bool).is_err());
/// ```
pub fn coerce(value: Value, kind: CoercionKind) -> Result<Value> {
    match kind {
        CoercionKind::Str => Ok(Value::String(stringify(&value))),
        CoercionKind::Int => {
            let rounded = parse_float(&value, kind)?.round_ties_even();
            if rounded < i64::MIN as f64 || rounded > i64::MAX as f64 {
                return Err(failure(&value, kind, "value is out of range for an integer"));
            }
            Ok(Value::Number(Number::from(rounded as i64)))
        }
        CoercionKind::Float => {
            let f = parse_float(&value, kind)?;
            Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| failure(&value, kind, "value is not a finite number"))
        }
        CoercionKind::Bool => {
            let cleaned = stringify(&value).trim().to_lowercase();
            match cleaned.as_str() {
                "true" | "1" | "yes" | "y" => Ok(Value::Bool(true)),
                "false" | "0" | "no" | "n" => Ok(Value::Bool(false)),
                _ => Err(failure(&value, kind, "did not match a true or false pattern")),
            }
        }
        CoercionKind::Json => match &value {
            Value::String(s) => {
                serde_json::from_str(s).map_err(|e| failure(&value, kind, e.to_string()))
            }
            _ => Ok(value),
        },
    }
}
