//! Sensor relay: stores distance/detection readings posted by a sensor device
//! and serves recent history to a polling dashboard.

pub mod api;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod error;
pub mod simulator;
pub mod storage;

pub use api::{router, AppState, StatusFlag};
pub use client::RelayClient;
pub use config::RelayConfig;
pub use domain::{Reading, SystemStatus};
pub use error::{ApiError, ClientError};
pub use storage::Database;
