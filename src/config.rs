//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `relay.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - ServerConfig: where the JSON API listens.
//!     - StorageConfig: where the SQLite file lives.
//!     - ClientConfig: which relay the dashboard and simulated device talk to.
//!     - SimulatorConfig: how often the simulated device reports.
//!     - LoggingConfig: log level and per-reading logging.
//!
//! the dashboard polling rate and live chart window are NOT configurable;
//! they are constants in dashboard/mod.rs.
//!
//! ==============================================================================

use log::{info, warn};
use serde::Deserialize;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClientConfig {
    pub api_url: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimulatorConfig {
    pub interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub show_sensor_data: bool,
    /// log file for the dashboard role, which owns the terminal
    pub dashboard_log: PathBuf,
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "Loaded from {}", path.display()),
            ConfigSource::Defaults => write!(f, "No config file found - using defaults"),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: SocketAddr::from(([0, 0, 0, 0], 3000)) }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { database_path: PathBuf::from("data").join("sensor_relay.db") }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { api_url: "http://127.0.0.1:3000".to_string() }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self { interval_ms: 2000 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            show_sensor_data: true,
            dashboard_log: PathBuf::from("dashboard.log"),
        }
    }
}

impl RelayConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))
    }

    /// Load with default fallback
    ///
    /// Runs before the logger exists, so the caller logs the returned
    /// source once logging is up (`Defaults` deserves a warning).
    pub fn load_or_default() -> (Self, ConfigSource) {
        Self::load_first(&[
            PathBuf::from("config").join("relay.toml"),
            PathBuf::from("..").join("config").join("relay.toml"),
        ])
    }

    /// First candidate that exists and parses wins
    pub fn load_first(paths: &[PathBuf]) -> (Self, ConfigSource) {
        for path in paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => return (config, ConfigSource::File(path.clone())),
                    Err(e) => {
                        eprintln!("[CONFIG] Warning: Failed to load {}: {}", path.display(), e);
                    }
                }
            }
        }

        (Self::default(), ConfigSource::Defaults)
    }

    /// Log configuration summary
    pub fn print_summary(&self) {
        info!("┌─────────────────────────────────────────┐");
        info!("│          RELAY CONFIGURATION            │");
        info!("├─────────────────────────────────────────┤");
        info!("│ Bind: {}", self.server.bind);
        info!("│ Database: {}", self.storage.database_path.display());
        info!("│ API URL: {}", self.client.api_url);
        info!("│ Simulator Interval: {}ms", self.simulator.interval_ms);
        info!("│ Log Level: {}", self.logging.level);
        info!("│ Dashboard Log: {}", self.logging.dashboard_log.display());
        info!("└─────────────────────────────────────────┘");
        if !self.logging.show_sensor_data {
            warn!("Per-reading logging disabled (logging.show_sensor_data = false)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = RelayConfig::parse("").unwrap();
        assert_eq!(config.server.bind.port(), 3000);
        assert_eq!(config.client.api_url, "http://127.0.0.1:3000");
        assert_eq!(config.simulator.interval_ms, 2000);
        assert!(config.logging.show_sensor_data);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = RelayConfig::parse(
            r#"
            [server]
            bind = "127.0.0.1:8080"

            [logging]
            show_sensor_data = false
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.show_sensor_data);
        assert_eq!(config.storage.database_path, PathBuf::from("data/sensor_relay.db"));
    }

    #[test]
    fn malformed_bind_is_rejected() {
        let err = RelayConfig::parse("[server]\nbind = \"not an address\"").unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn no_candidate_falls_back_to_defaults() {
        let missing = std::env::temp_dir().join("sensor-relay-no-such-dir").join("relay.toml");
        let (config, source) = RelayConfig::load_first(&[missing]);
        assert_eq!(source, ConfigSource::Defaults);
        assert_eq!(config.server.bind.port(), 3000);
        assert_eq!(source.to_string(), "No config file found - using defaults");
    }

    #[test]
    fn broken_candidate_is_skipped_for_the_next() {
        let dir = std::env::temp_dir().join(format!("sensor-relay-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let broken = dir.join("broken.toml");
        let good = dir.join("good.toml");
        std::fs::write(&broken, "[server\nbind = 1").unwrap();
        std::fs::write(&good, "[simulator]\ninterval_ms = 500\n").unwrap();

        let (config, source) = RelayConfig::load_first(&[broken, good.clone()]);
        assert_eq!(source, ConfigSource::File(good));
        assert_eq!(config.simulator.interval_ms, 500);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
