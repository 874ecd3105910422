//! SunPower PVS gateway client
//!
//! Talks to the gateway's `dl_cgi` endpoint. `DeviceList` is slow (roughly a
//! fifth of a second per device) but reliable; `DeviceDetails` is answered
//! with `{"result": "unknown command"}` by most firmware.

use crate::devices::DeviceRecord;
use crate::error::{Error, Result};
use reqwest::StatusCode;
use serde::Deserialize;

/// Response of the `DeviceList` command
///
/// `result` is `"succeed"` on a healthy gateway; anything else is logged.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceList {
    pub devices: Vec<DeviceRecord>,
    #[serde(default)]
    pub result: Option<String>,
}

/// Client for one gateway
#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: String,
    http: reqwest::Client,
}

impl GatewayClient {
    /// Create a client for a gateway at `base_url` (e.g. `http://172.27.153.1`)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a `dl_cgi` URL for a command and extra query parameters
    fn build_url(&self, command: &str, params: &[(&str, &str)]) -> String {
        let mut url = format!(
            "{}/cgi-bin/dl_cgi?Command={}",
            self.base_url,
            urlencoding::encode(command)
        );
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    /// Fetch the list of devices and their current readings
    pub async fn device_list(&self) -> Result<DeviceList> {
        let url = self.build_url("DeviceList", &[]);
        tracing::debug!(%url, "requesting device list");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transport { url, status, body });
        }

        let list: DeviceList = response.json().await?;
        let result = list.result.as_deref().unwrap_or_default();
        if result != "succeed" {
            tracing::warn!(result, "gateway did not report success for device list");
        }
        tracing::info!(devices = list.devices.len(), result, "fetched device list");
        Ok(list)
    }

    /// Ask for the details of one device
    ///
    /// The status is returned rather than checked since the command is
    /// unsupported on most gateways.
    pub async fn device_details(&self, serial: &str) -> Result<(StatusCode, serde_json::Value)> {
        let url = self.build_url("DeviceDetails", &[("SerialNumber", serial)]);
        tracing::debug!(%url, "requesting device details");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        let body = response.json().await?;
        Ok((status, body))
    }
}
