//! Typed HTTP client for the relay api.
//!
//! Shared by the dashboard poller and the simulated device.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::domain::{ControlRequest, IngestRequest, Reading, StatusMessage, StatusResponse, SystemStatus};
use crate::error::ClientError;

#[derive(Clone, Debug)]
pub struct RelayClient {
    http: Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http: Client::new(), base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET /api/sensor-data
    pub async fn sensor_data(&self) -> Result<Vec<Reading>, ClientError> {
        let response = self.http.get(self.url("/api/sensor-data")).send().await?;
        decode(response).await
    }

    /// GET /api/status
    pub async fn status(&self) -> Result<SystemStatus, ClientError> {
        let response = self.http.get(self.url("/api/status")).send().await?;
        let body: StatusResponse = decode(response).await?;
        Ok(body.status)
    }

    /// POST /api/control, returns the status the server settled on
    pub async fn control(&self, new_status: SystemStatus) -> Result<StatusMessage, ClientError> {
        let request = ControlRequest {
            new_status: Some(serde_json::Value::from(new_status.as_str())),
        };
        let response = self.http.post(self.url("/api/control")).json(&request).send().await?;
        decode(response).await
    }

    /// POST /api/data
    pub async fn post_reading(&self, distance: f64, led_state: u8) -> Result<StatusMessage, ClientError> {
        let request = IngestRequest {
            distance: Some(serde_json::Value::from(distance)),
            led_state: Some(serde_json::Value::from(led_state)),
        };
        let response = self.http.post(self.url("/api/data")).json(&request).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::ServerError(status.as_u16()));
    }
    Ok(response.json::<T>().await?)
}
