//! Run input as received from callers. External data (a form field, a config
//! file) arrives as JSON and may be malformed, so it reaches the processor's
//! runtime checks unchanged. Typed numbers are kept as-is, including
//! non-finite floats that JSON cannot represent.

use super::error::ProcessError;
use serde_json::{Number, Value};
use std::str::FromStr;

/// Ordered sequence of numbers handed to a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunInput {
    source: Source,
}

#[derive(Debug, Clone, PartialEq)]
enum Source {
    Numbers(Vec<f64>),
    Json(Value),
}

impl RunInput {
    pub fn from_json(raw: Value) -> Self {
        Self {
            source: Source::Json(raw),
        }
    }

    pub fn from_numbers(values: Vec<f64>) -> Self {
        Self {
            source: Source::Numbers(values),
        }
    }

    /// JSON rendition for display. Non-finite numbers render as `null`.
    pub fn to_json(&self) -> Value {
        match &self.source {
            Source::Numbers(values) => Value::Array(
                values
                    .iter()
                    .map(|value| Number::from_f64(*value).map_or(Value::Null, Value::Number))
                    .collect(),
            ),
            Source::Json(raw) => raw.clone(),
        }
    }

    /// Length as the input itself reports it, if it has one.
    ///
    /// Objects and strings report a length even though they are not sequences.
    pub fn reported_len(&self) -> Option<usize> {
        match &self.source {
            Source::Numbers(values) => Some(values.len()),
            Source::Json(Value::Array(items)) => Some(items.len()),
            Source::Json(Value::Object(fields)) => Some(fields.len()),
            Source::Json(Value::String(text)) => Some(text.chars().count()),
            Source::Json(Value::Null | Value::Bool(_) | Value::Number(_)) => None,
        }
    }

    /// Number of elements when the input is a sequence, zero otherwise.
    pub fn len(&self) -> usize {
        match &self.source {
            Source::Numbers(values) => values.len(),
            Source::Json(raw) => raw.as_array().map_or(0, Vec::len),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Input-level preconditions, zero length first.
    ///
    /// A non-sequence that reports zero length (`""`, `{}`) is classified as
    /// [`ProcessError::EmptyInput`]. On success every element is mapped to its
    /// numeric value, or `None` when it is not a number; elements are checked
    /// one at a time by the run loop.
    pub fn validate(&self) -> Result<Vec<Option<f64>>, ProcessError> {
        if self.reported_len() == Some(0) {
            return Err(ProcessError::EmptyInput);
        }
        match &self.source {
            Source::Numbers(values) => Ok(values.iter().copied().map(Some).collect()),
            Source::Json(Value::Array(items)) => Ok(items.iter().map(Value::as_f64).collect()),
            Source::Json(_) => Err(ProcessError::InvalidInput),
        }
    }
}

impl From<Value> for RunInput {
    fn from(raw: Value) -> Self {
        Self::from_json(raw)
    }
}

impl From<Vec<f64>> for RunInput {
    fn from(values: Vec<f64>) -> Self {
        Self::from_numbers(values)
    }
}

impl From<&[f64]> for RunInput {
    fn from(values: &[f64]) -> Self {
        Self::from_numbers(values.to_vec())
    }
}

impl From<Vec<i64>> for RunInput {
    fn from(values: Vec<i64>) -> Self {
        Self::from_json(Value::Array(values.into_iter().map(Value::from).collect()))
    }
}

impl FromStr for RunInput {
    type Err = serde_json::Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(text).map(Self::from_json)
    }
}
