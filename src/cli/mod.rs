//! CLI interface for solarstats

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Forward SunPower PVS telemetry to InfluxDB
#[derive(Parser)]
#[command(name = "solarstats")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (JSON, or YAML with a .yaml/.yml extension)
    #[arg(short, long, global = true, default_value = solarstats::config::DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Log filter, overrides the config file and RUST_LOG
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch device readings and write them to InfluxDB
    RecordStats {
        /// Print the lines being written
        #[arg(short, long)]
        verbose: bool,
    },

    /// Fetch device readings and print them as line protocol
    PrintLines,

    /// Show how far each device's data lags the gateway clock
    DebugTimestamps,

    /// Query the (mostly unsupported) DeviceDetails command
    DeviceDetails {
        /// Device serial number
        serial: String,
    },

    /// Validate a configuration file
    Check,

    /// Decode line-protocol lines and report the malformed ones
    CheckLines {
        /// File to read, standard input when omitted or `-`
        file: Option<PathBuf>,
    },

    /// Generate an example configuration file
    Init,
}
