//! Point definition
//!
//! A point is one time-series sample: measurement name, tag set, field set
//! and a nanosecond timestamp. Points are validated once at construction
//! and are read-only afterwards.

use crate::error::{Error, Result};
use std::collections::HashSet;

/// A typed field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Boolean(bool),
    /// Wider than i64 so that out-of-range integers can be carried to the
    /// encoder, which falls back to float notation for them.
    Integer(i128),
    Float(f64),
}

impl FieldValue {
    /// Short name of the value type, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::String(_) => "string",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Integer(_) => "integer",
            FieldValue::Float(_) => "float",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value as i128)
    }
}

impl From<i128> for FieldValue {
    fn from(value: i128) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

/// Check a measurement, tag key or field key.
///
/// First character must be an ASCII letter, the rest letters, digits or
/// underscores. The wire format is unquoted, so anything else is rejected.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_name(what: &str, name: &str) -> Result<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(Error::Validation(format!("invalid {} name {:?}", what, name)))
    }
}

/// One time-series sample
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    measurement: String,
    tags: Vec<(String, String)>,
    fields: Vec<(String, FieldValue)>,
    time: i64,
}

impl Point {
    /// Create a validated point
    ///
    /// Fields keep their insertion order on the wire. At least one field is
    /// required and keys must be unique within the tag set and the field set.
    pub fn new(
        measurement: impl Into<String>,
        fields: Vec<(String, FieldValue)>,
        tags: Vec<(String, String)>,
        time: i64,
    ) -> Result<Self> {
        let measurement = measurement.into();
        check_name("measurement", &measurement)?;

        if fields.is_empty() {
            return Err(Error::Validation(format!(
                "point '{}' has no fields",
                measurement
            )));
        }

        let mut seen = HashSet::new();
        for (key, value) in &fields {
            check_name("field", key)?;
            if !seen.insert(key.as_str()) {
                return Err(Error::Validation(format!("duplicate field '{}'", key)));
            }
            if let FieldValue::Float(f) = value {
                if !f.is_finite() {
                    return Err(Error::Validation(format!(
                        "field '{}' is not a finite number",
                        key
                    )));
                }
            }
        }

        let mut seen = HashSet::new();
        for (key, _) in &tags {
            check_name("tag", key)?;
            if !seen.insert(key.as_str()) {
                return Err(Error::Validation(format!("duplicate tag '{}'", key)));
            }
        }

        Ok(Self {
            measurement,
            tags,
            fields,
            time,
        })
    }

    /// Create a point stamped with the current wall-clock time
    pub fn now(
        measurement: impl Into<String>,
        fields: Vec<(String, FieldValue)>,
        tags: Vec<(String, String)>,
    ) -> Result<Self> {
        let time = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX);
        Self::new(measurement, fields, tags, time)
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn tags(&self) -> &[(String, String)] {
        &self.tags
    }

    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    /// Nanoseconds since the Unix epoch
    pub fn time(&self) -> i64 {
        self.time
    }

    /// Look up a field by key
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Look up a tag by key
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
