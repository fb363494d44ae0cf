//! Nature Remo Cloud API client.
//!
//! Fetches the device listing from the Nature Remo cloud and extracts the
//! newest temperature event of the first device. The API returns a JSON
//! array of devices; each device with a temperature sensor carries
//! `newest_events.te.val` in °C.
//!
//! API documentation: https://developer.nature.global/
//!
//! This module performs exactly one request per call and classifies the
//! outcome into `ServiceError` tags; retrying is the retry executor's job.

use serde::Deserialize;
use serde_json::Value;

use crate::model::ServiceError;

const REMO_BASE_URL: &str = "https://api.nature.global";

// ============================================================================
// API Response Structures
// ============================================================================

/// One device entry in the `/1/devices` response. Fields we do not use
/// (id, name, firmware version, …) are ignored during deserialization.
#[derive(Debug, Deserialize)]
pub struct DeviceRecord {
    #[serde(default)]
    pub newest_events: Option<NewestEvents>,
}

/// Latest sensor events reported by a device.
#[derive(Debug, Deserialize)]
pub struct NewestEvents {
    /// Temperature event. Absent on devices without a temperature sensor.
    #[serde(default)]
    pub te: Option<SensorEvent>,
}

/// A single sensor event.
#[derive(Debug, Deserialize)]
pub struct SensorEvent {
    /// Kept as raw JSON so a non-numeric value surfaces as a Validation
    /// error for this field instead of a decode failure for the whole body.
    pub val: Value,
}

// ============================================================================
// API Client Functions
// ============================================================================

/// Fetches the current temperature, in °C, of the first listed device.
///
/// Performs one `GET /1/devices` with bearer authentication and classifies
/// the outcome:
/// - 401 → `Auth`
/// - other 4xx → `Client` (terminal; the request itself is wrong)
/// - 5xx → `Retryable`
/// - transport timeout → `Timeout`
/// - other transport failure → `Retryable`
/// - any unexpected status → `Api`
pub fn fetch_current(
    client: &reqwest::blocking::Client,
    token: &str,
) -> Result<f64, ServiceError> {
    let url = format!("{}/1/devices", REMO_BASE_URL);

    let response = client
        .get(&url)
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .map_err(classify_transport_error)?;

    let status = response.status().as_u16();
    match status {
        200 => {
            let body = response.text().map_err(classify_transport_error)?;
            parse_devices_body(&body)
        }
        401 => Err(ServiceError::Auth(
            "invalid or expired API token".to_string(),
        )),
        400..=499 => Err(ServiceError::Client {
            status,
            detail: response.text().unwrap_or_default(),
        }),
        500..=599 => Err(ServiceError::Retryable {
            status: Some(status),
            detail: response.text().unwrap_or_default(),
        }),
        other => Err(ServiceError::Api(format!(
            "unexpected status code: {}",
            other
        ))),
    }
}

fn classify_transport_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Timeout(format!("request timed out: {}", err))
    } else {
        ServiceError::Retryable {
            status: None,
            detail: format!("network error: {}", err),
        }
    }
}

/// Extracts the temperature from a `/1/devices` response body.
///
/// Separate from the HTTP call so the extraction rules are testable with
/// canned payloads. All shape problems — undecodable JSON, an empty device
/// list, a first device without a temperature event, a non-numeric value —
/// are Validation errors.
pub fn parse_devices_body(body: &str) -> Result<f64, ServiceError> {
    let devices: Vec<DeviceRecord> = serde_json::from_str(body).map_err(|e| {
        ServiceError::Validation(format!("could not decode device listing: {}", e))
    })?;

    let device = devices.first().ok_or_else(|| {
        ServiceError::Validation("no devices found in API response".to_string())
    })?;

    let events = device.newest_events.as_ref().ok_or_else(|| {
        ServiceError::Validation("no newest_events in device data".to_string())
    })?;

    let event = events.te.as_ref().ok_or_else(|| {
        ServiceError::Validation("no temperature event in device data".to_string())
    })?;

    event.val.as_f64().ok_or_else(|| {
        ServiceError::Validation(format!("invalid temperature value: {}", event.val))
    })
}

// ============================================================================
// Tests
// ============================================================================
