//! Configuration schema definitions

use crate::sources::{GatewayAddress, CONSOLE_HOST};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Main configuration for solarstats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolarStatsConfig {
    /// Metrics backend settings
    pub influx: InfluxConfig,

    /// How to reach the PVS gateway
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

impl SolarStatsConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let url = &self.influx.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("influx.base_url must be an http(s) URL, got '{}'", url);
        }
        for (name, value) in [
            ("influx.org", &self.influx.org),
            ("influx.bucket", &self.influx.bucket),
        ] {
            if value.as_deref() == Some("") {
                bail!("{} cannot be empty", name);
            }
        }

        let gateway = &self.gateway;
        let set: Vec<&str> = [
            ("gateway.base_url", &gateway.base_url),
            ("gateway.host", &gateway.host),
            ("gateway.interface", &gateway.interface),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_ref().map(|v| (name, v)))
        .map(|(name, value)| {
            if value.is_empty() {
                bail!("{} cannot be empty", name);
            }
            Ok(name)
        })
        .collect::<Result<_>>()?;
        if set.len() > 1 {
            bail!("only one of {} may be set", set.join(", "));
        }

        if self.log.level.is_empty() {
            bail!("log.level cannot be empty");
        }

        Ok(())
    }
}

/// InfluxDB connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfluxConfig {
    /// Server URL, e.g. `http://localhost:8086`
    pub base_url: String,

    /// Default organisation for writes
    #[serde(default)]
    pub org: Option<String>,

    /// Default bucket for writes
    #[serde(default)]
    pub bucket: Option<String>,

    /// API token, sent as `Authorization: Token ...`
    #[serde(default)]
    pub token: Option<String>,
}

/// Gateway location. At most one field may be set; with none, the
/// console host name is resolved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Fixed base URL, e.g. `http://172.27.153.1`
    pub base_url: Option<String>,

    /// Host name to resolve
    pub host: Option<String>,

    /// Interface whose default route is the gateway
    pub interface: Option<String>,
}

impl GatewayConfig {
    /// Where to find the gateway
    pub fn address(&self) -> GatewayAddress {
        if let Some(url) = &self.base_url {
            GatewayAddress::Url(url.clone())
        } else if let Some(iface) = &self.interface {
            GatewayAddress::Interface(iface.clone())
        } else {
            let host = self.host.as_deref().unwrap_or(CONSOLE_HOST);
            GatewayAddress::Host(host.to_string())
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directive (default: info)
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String { "info".to_string() }
