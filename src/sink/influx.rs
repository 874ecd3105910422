//! InfluxDB v2 write client
//!
//! Posts line-protocol batches to `/api/v2/write` with nanosecond
//! precision.

use crate::config::InfluxConfig;
use crate::error::{Error, Result};
use crate::protocol::{encode_all, Point};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;

/// Client for one InfluxDB instance
#[derive(Debug, Clone)]
pub struct InfluxClient {
    base_url: String,
    org: Option<String>,
    bucket: Option<String>,
    token: Option<String>,
    http: reqwest::Client,
}

impl InfluxClient {
    /// Create a client with optional default org and bucket
    pub fn new(
        base_url: impl Into<String>,
        org: Option<String>,
        bucket: Option<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            org,
            bucket,
            token,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &InfluxConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            config.org.clone(),
            config.bucket.clone(),
            config.token.clone(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the write URL, falling back to the default org and bucket
    fn write_url(&self, org: Option<&str>, bucket: Option<&str>) -> Result<String> {
        let org = org
            .or(self.org.as_deref())
            .ok_or_else(|| Error::Config("no org specified, no default".to_string()))?;
        let bucket = bucket
            .or(self.bucket.as_deref())
            .ok_or_else(|| Error::Config("no bucket specified, no default".to_string()))?;

        Ok(format!(
            "{}/api/v2/write?org={}&bucket={}&precision=ns",
            self.base_url,
            urlencoding::encode(org),
            urlencoding::encode(bucket)
        ))
    }

    /// Write a batch of points
    ///
    /// `org` and `bucket` override the client defaults. Returns the server's
    /// status, or `None` for an empty batch, which is not sent.
    pub async fn write_points(
        &self,
        points: &[Point],
        org: Option<&str>,
        bucket: Option<&str>,
    ) -> Result<Option<StatusCode>> {
        let url = self.write_url(org, bucket)?;

        if points.is_empty() {
            tracing::info!("no points to write");
            return Ok(None);
        }

        let mut request = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "text/plain")
            .header(ACCEPT, "application/json")
            .body(encode_all(points));
        if let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) {
            // InfluxDB uses its own scheme name here, not "Bearer"
            request = request.header(AUTHORIZATION, format!("Token {}", token));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transport { url, status, body });
        }

        tracing::info!(points = points.len(), %status, "wrote points");
        Ok(Some(status))
    }
}
