//! Locating the gateway on the local network
//!
//! The PVS answers for `www.sunpowerconsole.com` on its installer LAN, so a
//! DNS lookup usually finds it. Alternatively the gateway is the default
//! route of the interface plugged into that LAN.

use anyhow::{bail, Context, Result};
use std::net::IpAddr;
use std::process::Command;

/// Host name the PVS resolves for on its own network
pub const CONSOLE_HOST: &str = "www.sunpowerconsole.com";

/// How to reach the gateway
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayAddress {
    /// Use this base URL as is
    Url(String),
    /// Resolve this host name to an IPv4 address
    Host(String),
    /// Use the default route of this network interface
    Interface(String),
}

impl GatewayAddress {
    /// Resolve to a base URL such as `http://172.27.153.1`
    pub async fn resolve(&self) -> Result<String> {
        let url = match self {
            GatewayAddress::Url(url) => url.trim_end_matches('/').to_string(),
            GatewayAddress::Host(host) => format!("http://{}", resolve_host(host).await?),
            GatewayAddress::Interface(iface) => format!("http://{}", default_gateway(iface)?),
        };
        tracing::debug!(address = ?self, %url, "resolved gateway");
        Ok(url)
    }
}

/// Resolve a host name to its first IPv4 address
pub async fn resolve_host(host: &str) -> Result<IpAddr> {
    let addrs = tokio::net::lookup_host((host, 80))
        .await
        .with_context(|| format!("failed to resolve {}", host))?;

    addrs
        .map(|addr| addr.ip())
        .find(IpAddr::is_ipv4)
        .with_context(|| format!("{} has no IPv4 address", host))
}

/// Default gateway of `interface`, from `ip route`
pub fn default_gateway(interface: &str) -> Result<IpAddr> {
    let output = Command::new("ip")
        .args(["route", "show", "0.0.0.0/0", "dev", interface])
        .output()
        .context("failed to run 'ip route'")?;

    if !output.status.success() {
        bail!(
            "'ip route' failed for {}: {}",
            interface,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    parse_route(&String::from_utf8_lossy(&output.stdout))
        .with_context(|| format!("no default route on {}", interface))
}

/// Extract the gateway from `default via <addr> ...`
fn parse_route(output: &str) -> Option<IpAddr> {
    output.split_whitespace().nth(2)?.parse().ok()
}
