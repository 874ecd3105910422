//! Data sources for solarstats
//!
//! The PVS gateway client and the ways of finding the gateway on the
//! network.

mod discovery;
mod gateway;

pub use discovery::{default_gateway, resolve_host, GatewayAddress, CONSOLE_HOST};
pub use gateway::{DeviceList, GatewayClient};
