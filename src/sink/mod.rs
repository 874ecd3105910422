//! Metrics backends points are written to

mod influx;

pub use influx::InfluxClient;
