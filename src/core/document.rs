//! Opaque tagged documents.
//!
//! Configuration snapshots and tag aggregates arrive as arbitrary nested
//! JSON. Nothing in the dashboard relies on their full shape, so they are
//! wrapped in [`Document`] and read through total path lookups that return
//! `None` instead of failing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// An arbitrary nested mapping received from a channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Value);

impl Document {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(Self(serde_json::from_str(text)?))
    }

    /// Walk `path` through nested objects.
    ///
    /// Returns `None` when any step is missing, when an intermediate value is
    /// not an object, or when the final value is JSON `null`.
    pub fn lookup(&self, path: &[&str]) -> Option<&Value> {
        lookup(&self.0, path)
    }

    /// Numeric scalar at `path`, see [`scalar_f64`].
    pub fn number(&self, path: &[&str]) -> Option<f64> {
        self.lookup(path).and_then(scalar_f64)
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Total path lookup over a JSON value.
pub fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.as_object()?.get(*key)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// Interpret a tag value as a finite number.
///
/// JSON numbers are taken as-is and numeric strings are parsed. Everything
/// else (bools, objects, arrays, free text, NaN/inf) reads as absent.
pub fn scalar_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}
