//! Independent validity checks for readings and the persisted file.
//!
//! Each validator is a pure function of its input (plus a read-only peek at
//! the filesystem for the CSV check). They perform no writes and no logging;
//! callers decide how to surface the outcome.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime};
use csv::ReaderBuilder;

use crate::model::{CSV_HEADER, ServiceError, TEMP_RANGE_MAX_C, TEMP_RANGE_MIN_C};

/// UTF-8 byte-order mark; rejected to keep the file strict UTF-8.
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

// ---------------------------------------------------------------------------
// Temperature
// ---------------------------------------------------------------------------

/// Whether a valid temperature falls inside the plausible range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureBand {
    /// Within [-50, 50] °C inclusive.
    Nominal,
    /// Numerically valid but outside the plausible range; the caller should
    /// record it with a warning rather than reject it.
    OutOfRange,
}

/// Checks that a temperature is a real, finite number.
///
/// NaN and ±infinity are Validation errors. Finite values outside
/// [-50, 50] °C are still valid — sensors do sit in freezers and saunas —
/// but come back tagged `OutOfRange` so the caller can flag them.
pub fn validate_temperature(celsius: f64) -> Result<TemperatureBand, ServiceError> {
    if celsius.is_nan() {
        return Err(ServiceError::Validation("temperature cannot be NaN".to_string()));
    }
    if celsius.is_infinite() {
        return Err(ServiceError::Validation("temperature cannot be infinity".to_string()));
    }

    if celsius < TEMP_RANGE_MIN_C || celsius > TEMP_RANGE_MAX_C {
        Ok(TemperatureBand::OutOfRange)
    } else {
        Ok(TemperatureBand::Nominal)
    }
}

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// Checks that a timestamp string is ISO 8601.
///
/// Accepts an explicit offset (`+00:00`, `-05:00`), a trailing `Z`, or an
/// offset-free `YYYY-MM-DDTHH:MM:SS[.f]` form. Anything else is a
/// Validation error.
pub fn validate_timestamp(timestamp: &str) -> Result<(), ServiceError> {
    if DateTime::parse_from_rfc3339(timestamp).is_ok() {
        return Ok(());
    }
    if NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f").is_ok() {
        return Ok(());
    }
    Err(ServiceError::Validation(format!(
        "invalid timestamp format: '{}'",
        timestamp
    )))
}

// ---------------------------------------------------------------------------
// CSV file format
// ---------------------------------------------------------------------------

/// Checks the shape of an existing CSV file before any write touches it.
///
/// A missing file is trivially valid (it will be created), and so is an
/// entirely empty one. Otherwise the file must be UTF-8 without a BOM and
/// its first line must parse as exactly the record
/// `timestamp,temperature`.
pub fn validate_csv_format(path: &Path) -> Result<(), ServiceError> {
    if !path.exists() {
        return Ok(());
    }

    let bytes = std::fs::read(path)
        .map_err(|e| ServiceError::Io(format!("failed to read {}: {}", path.display(), e)))?;

    if bytes.starts_with(&UTF8_BOM) {
        return Err(ServiceError::Validation(format!(
            "{} contains a UTF-8 BOM, which is not allowed",
            path.display()
        )));
    }

    let content = String::from_utf8(bytes).map_err(|e| {
        ServiceError::Validation(format!("{} is not valid UTF-8: {}", path.display(), e))
    })?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .from_reader(content.as_bytes());

    let first = match reader.records().next() {
        None => return Ok(()), // empty file
        Some(Err(e)) => {
            return Err(ServiceError::Validation(format!(
                "{} is not valid CSV: {}",
                path.display(),
                e
            )));
        }
        Some(Ok(record)) => record,
    };

    let header: Vec<&str> = first.iter().collect();
    if header != CSV_HEADER {
        return Err(ServiceError::Validation(format!(
            "invalid CSV header in {}: expected {:?}, got {:?}",
            path.display(),
            CSV_HEADER,
            header
        )));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
