//! Core data types for the temperature logging service.
//!
//! This module defines the shared domain model imported by all other modules.
//! It contains the reading type, the service-wide error enum, and the
//! constants that define the persisted CSV shape — no I/O.

use chrono::{DateTime, SecondsFormat, Utc};

// ---------------------------------------------------------------------------
// CSV shape constants
// ---------------------------------------------------------------------------

/// Header row every persisted CSV file must carry.
pub const CSV_HEADER: [&str; 2] = ["timestamp", "temperature"];

/// Lower bound of the plausible temperature range, in °C.
/// Readings below this are recorded but flagged at warning level.
pub const TEMP_RANGE_MIN_C: f64 = -50.0;

/// Upper bound of the plausible temperature range, in °C.
pub const TEMP_RANGE_MAX_C: f64 = 50.0;

// ---------------------------------------------------------------------------
// Reading type
// ---------------------------------------------------------------------------

/// A single temperature measurement, stamped at fetch time.
///
/// The timestamp is RFC 3339 with an explicit UTC offset, e.g.
/// `2024-01-01T12:00:00+00:00` — the exact string persisted to the CSV
/// file and used for duplicate detection.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureReading {
    pub timestamp: String,
    pub celsius: f64,
}

impl TemperatureReading {
    /// Builds a reading stamped at an explicit instant.
    /// Use this in tests to keep timestamps deterministic.
    pub fn at(instant: DateTime<Utc>, celsius: f64) -> Self {
        Self {
            timestamp: instant.to_rfc3339_opts(SecondsFormat::Secs, false),
            celsius,
        }
    }

    /// Builds a reading stamped with the current wall-clock time.
    pub fn now(celsius: f64) -> Self {
        Self::at(Utc::now(), celsius)
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while fetching, validating, or persisting a reading.
///
/// Every failure in the service carries one of these tags; the tag alone
/// drives the retry decision (`is_retryable`) and the exit-code reporting in
/// `main`. Callers match on the variant, never on message text.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Missing, invalid, or expired API credential. Terminal.
    Auth(String),
    /// The network call exceeded its deadline. Retryable.
    Timeout(String),
    /// Transient network or server (5xx) failure. Retryable.
    /// `status` is `None` for transport-level failures with no response.
    Retryable { status: Option<u16>, detail: String },
    /// HTTP 4xx other than 401 — the request itself is bad. Terminal.
    Client { status: u16, detail: String },
    /// Unexpected API behavior not covered by a more specific tag. Terminal.
    Api(String),
    /// Malformed data: temperature, timestamp, or CSV shape. Terminal.
    Validation(String),
    /// Filesystem failure while persisting. Terminal.
    Io(String),
}

impl ServiceError {
    /// Pure retry classifier: only timeouts and transient network/server
    /// failures are worth another attempt. Client errors, auth failures,
    /// validation failures, and I/O failures repeat deterministically, so
    /// every other tag classifies as `false`.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Timeout(_) | ServiceError::Retryable { .. })
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Auth(msg) => write!(f, "Authentication error: {}", msg),
            ServiceError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            ServiceError::Retryable { status: Some(code), detail } => {
                write!(f, "Server error: {} - {}", code, detail)
            }
            ServiceError::Retryable { status: None, detail } => {
                write!(f, "Network error: {}", detail)
            }
            ServiceError::Client { status, detail } => {
                write!(f, "Client error ({}): {}", status, detail)
            }
            ServiceError::Api(msg) => write!(f, "API error: {}", msg),
            ServiceError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ServiceError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timeout_and_server_failures_are_retryable() {
        assert!(ServiceError::Timeout("deadline exceeded".into()).is_retryable());
        assert!(
            ServiceError::Retryable { status: Some(503), detail: "unavailable".into() }
                .is_retryable()
        );
        assert!(
            ServiceError::Retryable { status: None, detail: "connection reset".into() }
                .is_retryable()
        );
    }

    #[test]
    fn test_terminal_failures_are_not_retryable() {
        let terminal = [
            ServiceError::Auth("no token".into()),
            ServiceError::Client { status: 400, detail: "bad request".into() },
            ServiceError::Client { status: 404, detail: "not found".into() },
            ServiceError::Api("unexpected status code: 302".into()),
            ServiceError::Validation("not a number".into()),
            ServiceError::Io("disk full".into()),
        ];
        for err in &terminal {
            assert!(
                !err.is_retryable(),
                "{:?} must not be retryable — retrying it would repeat the same failure",
                err
            );
        }
    }

    #[test]
    fn test_reading_at_renders_rfc3339_with_utc_offset() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let reading = TemperatureReading::at(instant, 23.5);
        assert_eq!(reading.timestamp, "2024-01-01T12:00:00+00:00");
        assert_eq!(reading.celsius, 23.5);
    }

    #[test]
    fn test_display_reports_the_kind() {
        let err = ServiceError::Client { status: 403, detail: "forbidden".into() };
        assert_eq!(err.to_string(), "Client error (403): forbidden");

        let err = ServiceError::Retryable { status: Some(502), detail: "bad gateway".into() };
        assert_eq!(err.to_string(), "Server error: 502 - bad gateway");
    }
}
