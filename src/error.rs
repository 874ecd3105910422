//! Error types for the mapping and transport layers

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building, encoding or shipping points
#[derive(Debug, Error)]
pub enum Error {
    /// A point failed validation (bad identifier, duplicate key, no fields...)
    #[error("invalid point: {0}")]
    Validation(String),

    /// A raw record value cannot be used as a tag or field
    #[error("unsupported value type for '{key}': {kind}")]
    UnsupportedType { key: String, kind: &'static str },

    /// A declared schema field or tag is absent from a matched record
    #[error("{device} record is missing field '{field}'")]
    MissingField { device: String, field: String },

    /// A raw string could not be converted to the declared type
    #[error("cannot convert '{field}' value {value:?} to {target}")]
    Coercion {
        field: String,
        value: String,
        target: &'static str,
    },

    /// Malformed gateway timestamp
    #[error("bad timestamp {input:?}: {reason}")]
    Format { input: String, reason: String },

    /// Non-2xx response from the gateway or the metrics backend
    #[error("{url} returned status {status}: {body}")]
    Transport {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    /// Connection or decoding failure below the HTTP status level
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Missing required write settings
    #[error("configuration error: {0}")]
    Config(String),
}
