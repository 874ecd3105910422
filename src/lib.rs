//! solarstats - SunPower PVS telemetry to InfluxDB
//!
//! Polls the gateway's device list, maps each device record to line-protocol
//! points through a per-device schema, and writes them to InfluxDB.

pub mod config;
pub mod devices;
pub mod error;
pub mod protocol;
pub mod sink;
pub mod sources;
pub mod timecodec;

pub use config::SolarStatsConfig;
pub use error::{Error, Result};
pub use protocol::{FieldValue, Point};

/// Fetch one device-list snapshot and map it to points
pub async fn poll_points(gateway: &sources::GatewayClient) -> Result<Vec<Point>> {
    let list = gateway.device_list().await?;
    devices::map_devices(&list.devices, devices::registry())
}
