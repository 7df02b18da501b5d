use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// one persisted sensor observation
/// field names are the wire names of GET /api/sensor-data
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Reading {
    /// surrogate key assigned by storage
    pub id: i64,
    /// measured distance in centimetres
    pub distance_cm: f64,
    /// true when the device reported led_state == 1
    pub led_is_on: bool,
    /// insert time, defaulted by storage
    pub created_at: DateTime<Utc>,
}

/// global on/off toggle gating whether readings are persisted
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SystemStatus {
    #[default]
    On,
    Off,
}

impl SystemStatus {
    /// accepts exactly "on" or "off"
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "on" => Some(SystemStatus::On),
            "off" => Some(SystemStatus::Off),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SystemStatus::On => "on",
            SystemStatus::Off => "off",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            SystemStatus::On => SystemStatus::Off,
            SystemStatus::Off => SystemStatus::On,
        }
    }
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// POST /api/data body
///
/// both fields stay raw json: presence is the only check the relay makes,
/// the values themselves are coerced further down.
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct IngestRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub led_state: Option<serde_json::Value>,
}

/// POST /api/control body
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct ControlRequest {
    #[serde(rename = "newStatus", default)]
    pub new_status: Option<serde_json::Value>,
}

/// body shared by ingest and control answers
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct StatusMessage {
    pub message: String,
    pub status: SystemStatus,
}

/// GET /api/status body
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct StatusResponse {
    pub status: SystemStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_is_exact() {
        assert_eq!(SystemStatus::parse("on"), Some(SystemStatus::On));
        assert_eq!(SystemStatus::parse("off"), Some(SystemStatus::Off));
        assert_eq!(SystemStatus::parse("ON"), None);
        assert_eq!(SystemStatus::parse("maybe"), None);
        assert_eq!(SystemStatus::parse(""), None);
    }

    #[test]
    fn status_defaults_to_on_and_toggles() {
        let status = SystemStatus::default();
        assert_eq!(status, SystemStatus::On);
        assert_eq!(status.toggled(), SystemStatus::Off);
        assert_eq!(status.toggled().toggled(), SystemStatus::On);
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&StatusResponse { status: SystemStatus::Off }).unwrap();
        assert_eq!(json, r#"{"status":"off"}"#);
    }

    #[test]
    fn ingest_request_treats_null_as_absent() {
        let req: IngestRequest = serde_json::from_str(r#"{"distance": 5, "led_state": null}"#).unwrap();
        assert!(req.distance.is_some());
        assert!(req.led_state.is_none());
    }

    #[test]
    fn control_request_reads_camel_case_field() {
        let req: ControlRequest = serde_json::from_str(r#"{"newStatus": "off"}"#).unwrap();
        assert_eq!(req.new_status, Some(serde_json::json!("off")));
    }
}
