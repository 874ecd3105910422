//! solarstats - SunPower PVS telemetry to InfluxDB

use anyhow::{Context, Result};
use clap::Parser;
use solarstats::config::{self, SolarStatsConfig};
use solarstats::protocol::{decode_lines, encode};
use solarstats::sink::InfluxClient;
use solarstats::sources::GatewayClient;
use solarstats::timecodec;
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;

use cli::{Cli, Commands};

/// Pick the log filter: flag, then RUST_LOG, then the config file
fn resolve_log_level(cli: &Cli) -> String {
    if let Some(level) = &cli.log_level {
        return level.clone();
    }
    if let Ok(level) = std::env::var("RUST_LOG") {
        return level;
    }
    if let Ok(cfg) = config::load_config(&cli.config) {
        return cfg.log.level;
    }
    "info".to_string()
}

/// Initialize the tracing subscriber, logging to stderr
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();

    Ok(())
}

/// Resolve the gateway address from the config
async fn gateway_client(cfg: &SolarStatsConfig) -> Result<GatewayClient> {
    let address = cfg.gateway.address();
    let base_url = address
        .resolve()
        .await
        .with_context(|| format!("failed to locate gateway ({:?})", address))?;
    Ok(GatewayClient::new(base_url))
}

fn print_check(path: &Path, cfg: &SolarStatsConfig) {
    println!("Configuration at {:?} is valid!", path);
    println!("  InfluxDB: {}", cfg.influx.base_url);
    println!("    org: {}", cfg.influx.org.as_deref().unwrap_or("(none)"));
    println!("    bucket: {}", cfg.influx.bucket.as_deref().unwrap_or("(none)"));
    println!(
        "    token: {}",
        if cfg.influx.token.is_some() { "set" } else { "not set" }
    );
    println!("  Gateway: {:?}", cfg.gateway.address());
    println!("  Log level: {}", cfg.log.level);
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&resolve_log_level(&cli))?;

    match cli.command {
        Commands::RecordStats { verbose } => {
            let cfg = config::load_config(&cli.config)?;
            let influx = InfluxClient::from_config(&cfg.influx);

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(async {
                let gateway = gateway_client(&cfg).await?;
                if verbose {
                    println!("making request to {}...", gateway.base_url());
                }

                let points = solarstats::poll_points(&gateway).await?;

                if verbose {
                    println!("{}", chrono::Utc::now().to_rfc3339());
                    for point in &points {
                        print!("{}", encode(point));
                    }
                }

                match influx.write_points(&points, None, None).await? {
                    Some(status) => println!(
                        "wrote {} points to {} ({})",
                        points.len(),
                        influx.base_url(),
                        status
                    ),
                    None => println!("no points to write, nothing sent"),
                }
                Ok::<_, anyhow::Error>(())
            })?;
        }

        Commands::PrintLines => {
            let cfg = config::load_config(&cli.config)?;

            let rt = tokio::runtime::Runtime::new()?;
            let points = rt.block_on(async {
                let gateway = gateway_client(&cfg).await?;
                Ok::<_, anyhow::Error>(solarstats::poll_points(&gateway).await?)
            })?;

            for point in &points {
                print!("{}", encode(point));
            }
        }

        Commands::DebugTimestamps => {
            let cfg = config::load_config(&cli.config)?;

            let rt = tokio::runtime::Runtime::new()?;
            let list = rt.block_on(async {
                let gateway = gateway_client(&cfg).await?;
                Ok::<_, anyhow::Error>(gateway.device_list().await?)
            })?;

            let show = |time: Option<&str>| -> Result<String> {
                match time {
                    Some(t) => Ok(timecodec::to_datetime(t)?.to_rfc3339()),
                    None => Ok("-".to_string()),
                }
            };

            for device in &list.devices {
                println!(
                    "{:20} {} {}",
                    device.serial().unwrap_or("-"),
                    show(device.curtime())?,
                    show(device.datatime())?
                );
            }
        }

        Commands::DeviceDetails { serial } => {
            let cfg = config::load_config(&cli.config)?;

            let rt = tokio::runtime::Runtime::new()?;
            let (status, body) = rt.block_on(async {
                let gateway = gateway_client(&cfg).await?;
                Ok::<_, anyhow::Error>(gateway.device_details(&serial).await?)
            })?;

            println!("{}", status);
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Commands::Check => {
            println!("Checking configuration at {:?}...", cli.config);

            match config::load_config(&cli.config) {
                Ok(cfg) => print_check(&cli.config, &cfg),
                Err(e) => {
                    println!("Configuration is invalid: {:#}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::CheckLines { file } => {
            let input = match file.as_deref().filter(|f| *f != Path::new("-")) {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {:?}", path))?,
                None => std::io::read_to_string(std::io::stdin())
                    .context("failed to read standard input")?,
            };

            let (points, failures) = decode_lines(&input);
            for (line, e) in &failures {
                eprintln!("line {}: {}", line, e);
            }
            println!("{} valid, {} malformed", points.len(), failures.len());
            if !failures.is_empty() {
                std::process::exit(1);
            }
        }

                Commands::Init => {
            let example_config = include_str!("../solarstatconf.example.json");

            let path = &cli.config;
            if path.exists() {
                println!("{:?} already exists. Not overwriting.", path);
            } else {
                std::fs::write(path, example_config)?;
                println!("Created {:?} with example configuration.", path);
            }
        }
    }

    Ok(())
}
