//! Error taxonomy shared by the relay service and its clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Failures the JSON API reports to its caller.
#[derive(Debug, Error)]
pub enum ApiError {
    /// `distance` or `led_state` absent from an ingest body.
    #[error("Missing distance or led_state")]
    MissingField,
    /// Control value outside {"on", "off"}.
    #[error("Invalid status. Must be \"on\" or \"off\".")]
    InvalidValue,
    /// Store unreachable or query rejected. The cause is logged, never sent.
    #[error("Database error")]
    StorageFailure(#[source] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingField | ApiError::InvalidValue => StatusCode::BAD_REQUEST,
            ApiError::StorageFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}

/// Failures seen by the dashboard and the simulated device.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure or a body that would not decode.
    #[error("network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),
    /// Any non-2xx answer.
    #[error("server answered with status {0}")]
    ServerError(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_input_errors_are_bad_request() {
        assert_eq!(ApiError::MissingField.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidValue.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn storage_failure_hides_cause() {
        let err = ApiError::StorageFailure(anyhow::anyhow!("disk on fire"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Database error");
    }
}
