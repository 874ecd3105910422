//! Raw device record as returned by the gateway's DeviceList command

use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

/// One entry of the gateway's `devices` array
///
/// Values normally arrive as JSON strings, numerics included. Other scalars
/// are stringified on access; nested values cannot be used.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct DeviceRecord(Map<String, Value>);

impl DeviceRecord {
    /// Borrow a value that is a JSON string
    fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// True if `key` holds exactly the string `expected`
    pub fn has(&self, key: &str, expected: &str) -> bool {
        self.get_str(key) == Some(expected)
    }

    /// Stringified value for `key`
    ///
    /// Missing keys are a [`Error::MissingField`]; arrays, objects and nulls
    /// are an [`Error::UnsupportedType`].
    pub fn value(&self, key: &str) -> Result<String> {
        match self.0.get(key) {
            None => Err(Error::MissingField {
                device: self.device_type().unwrap_or("unknown").to_string(),
                field: key.to_string(),
            }),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            Some(other) => Err(Error::UnsupportedType {
                key: key.to_string(),
                kind: match other {
                    Value::Null => "null",
                    Value::Array(_) => "array",
                    _ => "object",
                },
            }),
        }
    }

    pub fn device_type(&self) -> Option<&str> {
        self.get_str("DEVICE_TYPE")
    }

    pub fn serial(&self) -> Option<&str> {
        self.get_str("SERIAL")
    }

    pub fn subtype(&self) -> Option<&str> {
        self.get_str("subtype")
    }

    /// Time the device's readings were taken
    pub fn datatime(&self) -> Option<&str> {
        self.get_str("DATATIME")
    }

    /// Gateway clock at the time of the request
    pub fn curtime(&self) -> Option<&str> {
        self.get_str("CURTIME")
    }
}

/// Builders for hand-made records
#[cfg(test)]
impl DeviceRecord {
    pub(crate) fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into())))
                .collect(),
        )
    }

    /// Insert or replace a string value
    pub(crate) fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), Value::String(value.into()));
    }

    /// Remove a key, returning whether it was present
    pub(crate) fn remove(&mut self, key: &str) -> bool {
        self.0.remove(key).is_some()
    }
}
