//! ==============================================================================
//! api.rs - ingest/query json api
//! ==============================================================================
//!
//! purpose:
//!     the http face of the relay. the sensor device posts readings and polls
//!     the on/off flag, the dashboard reads history and flips the flag.
//!
//! routes:
//!     POST /api/data          store one reading (dropped while the system is off)
//!     GET  /api/status        current on/off flag
//!     POST /api/control       set the on/off flag
//!     GET  /api/sensor-data   newest 100 readings, oldest first
//!
//! relationships:
//!     - uses: storage (sensor_data table)
//!     - used by: main.rs (serve role), tests/api.rs
//!
//! shared state:
//!     the on/off flag lives in this process only. two relay processes behind
//!     one load balancer would each hold their own flag and disagree; moving it
//!     into the database is the fix if that deployment ever happens.
//!
//! ==============================================================================

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use log::{debug, error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::RelayConfig;
use crate::domain::{
    ControlRequest, IngestRequest, Reading, StatusMessage, StatusResponse, SystemStatus,
};
use crate::error::ApiError;
use crate::storage::{Database, HISTORY_LIMIT};

// ==============================================================================
// shared state
// ==============================================================================

/// process-wide on/off flag, starts `on`
///
/// plain relaxed loads and stores: writes are rare and the last one wins.
#[derive(Clone, Debug)]
pub struct StatusFlag(Arc<AtomicBool>);

impl StatusFlag {
    pub fn new(initial: SystemStatus) -> Self {
        Self(Arc::new(AtomicBool::new(initial == SystemStatus::On)))
    }

    pub fn get(&self) -> SystemStatus {
        if self.0.load(Ordering::Relaxed) {
            SystemStatus::On
        } else {
            SystemStatus::Off
        }
    }

    pub fn set(&self, status: SystemStatus) {
        self.0.store(status == SystemStatus::On, Ordering::Relaxed);
    }
}

impl Default for StatusFlag {
    fn default() -> Self {
        Self::new(SystemStatus::default())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub status: StatusFlag,
    /// log every accepted reading
    pub show_sensor_data: bool,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self { db, status: StatusFlag::default(), show_sensor_data: true }
    }
}

// ==============================================================================
// web server
// ==============================================================================

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/data", post(ingest_handler))
        .route("/api/status", get(status_handler))
        .route("/api/control", post(control_handler))
        .route("/api/sensor-data", get(sensor_data_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// serve the api on an already bound listener until the process ends
pub async fn run_server(listener: tokio::net::TcpListener, state: AppState) -> Result<()> {
    axum::serve(listener, router(state))
        .await
        .context("web server stopped")?;
    Ok(())
}

/// open storage, bind the configured address and serve
pub async fn serve(config: &RelayConfig) -> Result<()> {
    let db = Database::open(config.storage.database_path.clone())?;
    let mut state = AppState::new(db);
    state.show_sensor_data = config.logging.show_sensor_data;

    let listener = tokio::net::TcpListener::bind(config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;

    info!("Server listening at http://{}", listener.local_addr()?);
    info!("System is initially: {}", state.status.get());

    run_server(listener, state).await
}

// ==============================================================================
// handlers
// ==============================================================================

/// POST /api/data
///
/// the off check comes first: an off system answers the off payload
/// for any body, complete or not.
async fn ingest_handler(
    State(state): State<AppState>,
    body: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<StatusMessage>), ApiError> {
    if state.status.get() == SystemStatus::Off {
        return Ok((
            StatusCode::OK,
            Json(StatusMessage {
                message: "System is off. Data not saved.".to_string(),
                status: SystemStatus::Off,
            }),
        ));
    }

    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Ingest body rejected: {}", rejection.body_text());
            IngestRequest::default()
        }
    };
    let (Some(distance), Some(led_state)) = (request.distance, request.led_state) else {
        return Err(ApiError::MissingField);
    };

    if state.show_sensor_data {
        info!("Received data: Distance = {} cm, LED State = {}", distance, led_state);
    }

    let led_is_on = led_state.as_f64() == Some(1.0);

    if let Err(e) = state.db.insert_reading(distance, led_is_on).await {
        error!("Error inserting data into database: {:#}", e);
        return Err(ApiError::StorageFailure(e));
    }

    Ok((
        StatusCode::CREATED,
        Json(StatusMessage {
            message: "Data saved successfully".to_string(),
            status: state.status.get(),
        }),
    ))
}

/// GET /api/status
async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let status = state.status.get();
    info!("Status check from device: Status is {}", status);
    Json(StatusResponse { status })
}

/// POST /api/control
async fn control_handler(
    State(state): State<AppState>,
    body: Result<Json<ControlRequest>, JsonRejection>,
) -> Result<Json<StatusMessage>, ApiError> {
    let requested = match body {
        Ok(Json(request)) => request.new_status,
        Err(rejection) => {
            debug!("Control body rejected: {}", rejection.body_text());
            None
        }
    };
    let new_status = requested
        .and_then(|value| value.as_str().and_then(SystemStatus::parse))
        .ok_or(ApiError::InvalidValue)?;

    state.status.set(new_status);
    info!("System status changed to: {}", new_status);

    Ok(Json(StatusMessage {
        message: format!("System is now {}", new_status),
        status: new_status,
    }))
}

/// GET /api/sensor-data
async fn sensor_data_handler(State(state): State<AppState>) -> Result<Json<Vec<Reading>>, ApiError> {
    match state.db.recent_readings(HISTORY_LIMIT).await {
        Ok(readings) => Ok(Json(readings)),
        Err(e) => {
            error!("Error fetching sensor data: {:#}", e);
            Err(ApiError::StorageFailure(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_starts_on_and_last_write_wins() {
        let flag = StatusFlag::default();
        assert_eq!(flag.get(), SystemStatus::On);

        let shared = flag.clone();
        shared.set(SystemStatus::Off);
        assert_eq!(flag.get(), SystemStatus::Off);

        flag.set(SystemStatus::On);
        flag.set(SystemStatus::On);
        assert_eq!(shared.get(), SystemStatus::On);
    }

    #[tokio::test]
    async fn ingest_while_off_ignores_body() {
        let state = AppState::new(Database::open_in_memory().unwrap());
        state.status.set(SystemStatus::Off);

        let (code, Json(body)) = ingest_handler(State(state.clone()), Ok(Json(IngestRequest::default())))
            .await
            .unwrap();
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body.status, SystemStatus::Off);
        assert_eq!(state.db.count_readings().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn led_state_other_than_one_is_off() {
        let state = AppState::new(Database::open_in_memory().unwrap());
        for led_state in [serde_json::json!(0), serde_json::json!("1"), serde_json::json!(2)] {
            let request = IngestRequest {
                distance: Some(serde_json::json!(3)),
                led_state: Some(led_state),
            };
            ingest_handler(State(state.clone()), Ok(Json(request))).await.unwrap();
        }

        let readings = state.db.recent_readings(HISTORY_LIMIT).await.unwrap();
        assert_eq!(readings.len(), 3);
        assert!(readings.iter().all(|r| !r.led_is_on));
    }

    #[tokio::test]
    async fn control_rejects_non_string_status() {
        let state = AppState::new(Database::open_in_memory().unwrap());
        let request = ControlRequest { new_status: Some(serde_json::json!(0)) };

        let err = control_handler(State(state.clone()), Ok(Json(request))).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidValue));
        assert_eq!(state.status.get(), SystemStatus::On);
    }
}
