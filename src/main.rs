//! ==============================================================================
//! main.rs - sensor relay entry point
//! ==============================================================================
//!
//! purpose:
//!     one binary, three roles:
//!     - serve:     the json api + sqlite store the device and dashboard talk to
//!     - dashboard: terminal dashboard polling the api every 2s
//!     - simulate:  fake sensor device posting readings while the system is on
//!
//! architecture:
//!
//!     ┌──────────────┐  POST /api/data    ┌──────────────────────────┐
//!     │ sensor       │ ─────────────────▶ │ relay (serve)            │
//!     │ (simulate)   │ ◀───────────────── │  ┌────────┐ ┌─────────┐  │
//!     └──────────────┘  GET /api/status   │  │ on/off │ │ sqlite  │  │
//!                                         │  │ flag   │ │ readings│  │
//!     ┌──────────────┐  GET sensor-data   │  └────────┘ └─────────┘  │
//!     │ dashboard    │ ─────────────────▶ │                          │
//!     │ (2s poll)    │ POST /api/control  │                          │
//!     └──────────────┘ ─────────────────▶ └──────────────────────────┘
//!
//! ==============================================================================

use anyhow::{bail, Context, Result};
use log::{info, warn};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sensor_relay::config::{ConfigSource, RelayConfig};
use sensor_relay::dashboard::Dashboard;
use sensor_relay::{api, simulator, RelayClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Serve,
    Dashboard,
    Simulate,
}

impl Role {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "serve" => Some(Role::Serve),
            "dashboard" => Some(Role::Dashboard),
            "simulate" => Some(Role::Simulate),
            _ => None,
        }
    }
}

/// `log_file` takes log output off stderr, for roles that draw on the terminal
fn setup_logger(level: &str, log_file: Option<&Path>) -> Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", level);
    }

    let mut builder = env_logger::Builder::from_default_env();
    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn print_help() {
    println!("sensor-relay v{}", env!("CARGO_PKG_VERSION"));
    println!("Stores distance sensor readings and serves them to a polling dashboard\n");
    println!("USAGE:");
    println!("    sensor-relay [ROLE] [CONFIG_FILE]\n");
    println!("ROLES:");
    println!("    serve        Run the JSON API (default)");
    println!("    dashboard    Poll the API and draw charts/tables; enter toggles on/off, q quits");
    println!("    simulate     Act as the sensor device, posting random readings\n");
    println!("OPTIONS:");
    println!("    -h, --help   Show this help message\n");
    println!("ARGUMENTS:");
    println!("    [CONFIG_FILE]    Path to relay.toml (default: config/relay.toml)");
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut role = Role::Serve;
    let mut config_path: Option<PathBuf> = None;

    for arg in std::env::args().skip(1) {
        if arg == "-h" || arg == "--help" {
            print_help();
            return Ok(());
        }
        match Role::parse(&arg) {
            Some(r) => role = r,
            None if config_path.is_none() => config_path = Some(PathBuf::from(arg)),
            None => bail!("unexpected argument '{}' (see --help)", arg),
        }
    }

    // step 1: load configuration
    let (config, source) = match &config_path {
        Some(path) => (RelayConfig::load(path)?, ConfigSource::File(path.clone())),
        None => RelayConfig::load_or_default(),
    };

    let log_file = (role == Role::Dashboard).then(|| config.logging.dashboard_log.as_path());
    setup_logger(&config.logging.level, log_file)?;
    match &source {
        ConfigSource::File(_) => info!("[CONFIG] {}", source),
        ConfigSource::Defaults => warn!("[CONFIG] {}", source),
    }
    config.print_summary();

    // step 2: run the chosen role
    match role {
        Role::Serve => {
            info!("===========================================================");
            info!("  Sensor Relay - ingest + history API");
            info!("===========================================================");
            api::serve(&config).await
        }
        Role::Dashboard => {
            let client = RelayClient::new(config.client.api_url.clone());
            Dashboard::new(client).run().await
        }
        Role::Simulate => {
            let client = RelayClient::new(config.client.api_url.clone());
            simulator::run(client, Duration::from_millis(config.simulator.interval_ms)).await
        }
    }
}
