//! Durable CSV persistence for temperature readings.
//!
//! `save_reading` is the sole mutator of the log file. Every call
//! re-validates the existing file, rejects duplicate timestamps, and writes
//! through a copy → append → atomic-rename protocol so a crash or write
//! failure mid-operation can never leave a partially-written file behind.
//!
//! # Known limitation
//! Concurrent invocations racing on the same path are not guarded against:
//! both may pass the duplicate scan and each atomically replace the file,
//! with the later rename winning wholesale. The protocol protects against
//! process crashes and write failures, not concurrent writers.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use csv::{Reader, WriterBuilder};

use crate::logging::{Component, LogLevel, Logger};
use crate::model::{CSV_HEADER, ServiceError, TEMP_RANGE_MAX_C, TEMP_RANGE_MIN_C, TemperatureReading};
use crate::validate::{TemperatureBand, validate_csv_format, validate_temperature, validate_timestamp};

/// Appends one reading to the CSV file at `path`, creating the file (and
/// its parent directories) with a header row when absent.
///
/// Preconditions run in order and abort the whole operation on first
/// failure: existing-file format, timestamp shape, temperature sanity
/// (out-of-range values pass with a WARN), then a duplicate-timestamp scan.
/// Only after all of them does any write happen.
///
/// On success the file has gained exactly one row; on any failure the
/// original file is byte-identical to its pre-call state.
pub fn save_reading(
    logger: &Logger,
    reading: &TemperatureReading,
    path: &Path,
) -> Result<(), ServiceError> {
    validate_csv_format(path)?;
    validate_timestamp(&reading.timestamp)?;

    if validate_temperature(reading.celsius)? == TemperatureBand::OutOfRange {
        logger.warn(
            Component::Csv,
            &format!(
                "temperature {}°C is outside the plausible range ({}°C to {}°C)",
                reading.celsius, TEMP_RANGE_MIN_C, TEMP_RANGE_MAX_C
            ),
        );
    }

    if timestamp_exists(&reading.timestamp, path)? {
        return Err(ServiceError::Validation(format!(
            "duplicate timestamp: {}",
            reading.timestamp
        )));
    }

    // Exactly one fractional digit, per the file format contract.
    let formatted = format!("{:.1}", reading.celsius);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                ServiceError::Io(format!(
                    "failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    write_via_replace(logger, path, &reading.timestamp, &formatted)
}

// ---------------------------------------------------------------------------
// Duplicate detection
// ---------------------------------------------------------------------------

/// Linear scan of the existing data rows for an exact timestamp match.
/// The file is small and append-only, so a full scan per save is fine.
fn timestamp_exists(timestamp: &str, path: &Path) -> Result<bool, ServiceError> {
    if !path.exists() {
        return Ok(false);
    }

    let mut reader = Reader::from_path(path)
        .map_err(|e| ServiceError::Io(format!("failed to open {}: {}", path.display(), e)))?;

    for record in reader.records() {
        let record = record.map_err(|e| {
            if e.is_io_error() {
                ServiceError::Io(format!("failed to read {}: {}", path.display(), e))
            } else {
                ServiceError::Validation(format!("{} is not valid CSV: {}", path.display(), e))
            }
        })?;
        if record.get(0) == Some(timestamp) {
            return Ok(true);
        }
    }

    Ok(false)
}

// ---------------------------------------------------------------------------
// Copy → append → atomic rename
// ---------------------------------------------------------------------------

/// Sibling temporary path: `temperature.csv` → `temperature.csv.tmp`.
/// Must share a directory with the target so the final rename is atomic.
fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_via_replace(
    logger: &Logger,
    path: &Path,
    timestamp: &str,
    temperature: &str,
) -> Result<(), ServiceError> {
    let tmp = temp_sibling(path);
    let file_exists = path.exists();
    let needs_header = !file_exists
        || fs::metadata(path)
            .map_err(|e| ServiceError::Io(format!("failed to stat {}: {}", path.display(), e)))?
            .len()
            == 0;

    if file_exists {
        if let Err(e) = fs::copy(path, &tmp) {
            let _ = fs::remove_file(&tmp);
            return Err(ServiceError::Io(format!(
                "failed to copy {} to {}: {}",
                path.display(),
                tmp.display(),
                e
            )));
        }
        logger.debug(
            Component::Csv,
            &format!("copied existing file to temporary path {}", tmp.display()),
        );
    }

    if let Err(e) = append_row(&tmp, needs_header, timestamp, temperature) {
        let _ = fs::remove_file(&tmp);
        return Err(ServiceError::Io(format!(
            "failed to write {}: {}",
            tmp.display(),
            e
        )));
    }

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(ServiceError::Io(format!(
            "failed to replace {}: {}",
            path.display(),
            e
        )));
    }

    logger.log(
        LogLevel::Info,
        Component::Csv,
        Some(&path.display().to_string()),
        &format!("saved reading: {}, {}°C", timestamp, temperature),
    );
    Ok(())
}

/// Appends the (possibly header +) data row to the temporary file in UTF-8
/// without a BOM.
fn append_row(
    tmp: &Path,
    needs_header: bool,
    timestamp: &str,
    temperature: &str,
) -> csv::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(tmp)?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

    if needs_header {
        writer.write_record(CSV_HEADER)?;
    }
    writer.write_record([timestamp, temperature])?;
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;

    /// Per-test scratch directory under the system temp dir.
    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "templog_store_{}_{}",
            std::process::id(),
            name
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn quiet_logger() -> Logger {
        Logger::new(LogLevel::Error)
    }

    fn reading(timestamp: &str, celsius: f64) -> TemperatureReading {
        TemperatureReading { timestamp: timestamp.to_string(), celsius }
    }

    #[test]
    fn test_missing_file_gets_header_and_one_row() {
        let dir = scratch_dir("create");
        let path = dir.join("temperature.csv");

        save_reading(&quiet_logger(), &reading("2024-01-01T00:00:00+00:00", 21.3), &path)
            .expect("saving to a missing file should create it");

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "timestamp,temperature\n2024-01-01T00:00:00+00:00,21.3\n");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_parent_directories_are_created_recursively() {
        let dir = scratch_dir("nested");
        let path = dir.join("a").join("b").join("temperature.csv");

        save_reading(&quiet_logger(), &reading("2024-01-01T00:00:00+00:00", 20.0), &path)
            .expect("missing parent directories should be created");

        assert!(path.exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_second_save_appends_without_second_header() {
        let dir = scratch_dir("append");
        let path = dir.join("temperature.csv");
        let logger = quiet_logger();

        save_reading(&logger, &reading("2024-01-01T00:00:00+00:00", 21.3), &path).unwrap();
        save_reading(&logger, &reading("2024-01-01T01:00:00+00:00", 22.0), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "timestamp,temperature\n\
             2024-01-01T00:00:00+00:00,21.3\n\
             2024-01-01T01:00:00+00:00,22.0\n"
        );
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_temperature_is_formatted_to_one_fractional_digit() {
        let dir = scratch_dir("format");
        let path = dir.join("temperature.csv");
        let logger = quiet_logger();

        save_reading(&logger, &reading("2024-01-01T00:00:00+00:00", 21.0), &path).unwrap();
        save_reading(&logger, &reading("2024-01-01T01:00:00+00:00", 22.35), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("2024-01-01T00:00:00+00:00,21.0\n"));
        // 22.35 rounds under the default float formatting
        assert!(content.contains("2024-01-01T01:00:00+00:00,22.3\n"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_duplicate_timestamp_is_rejected_and_file_unchanged() {
        let dir = scratch_dir("duplicate");
        let path = dir.join("temperature.csv");
        let logger = quiet_logger();
        let first = reading("2024-01-01T00:00:00+00:00", 21.3);

        save_reading(&logger, &first, &path).unwrap();
        let before = fs::read(&path).unwrap();

        let err = save_reading(&logger, &reading("2024-01-01T00:00:00+00:00", 25.0), &path)
            .unwrap_err();
        assert!(
            matches!(err, ServiceError::Validation(ref msg) if msg.contains("duplicate")),
            "second save with the same timestamp should be a duplicate error, got {:?}",
            err
        );

        let after = fs::read(&path).unwrap();
        assert_eq!(before, after, "failed save must leave the file byte-identical");
        assert!(!temp_sibling(&path).exists(), "no temporary file may be left behind");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_out_of_range_temperature_is_saved() {
        let dir = scratch_dir("out_of_range");
        let path = dir.join("temperature.csv");

        save_reading(&quiet_logger(), &reading("2024-01-01T00:00:00+00:00", 87.6), &path)
            .expect("out-of-range temperatures are valid, only flagged");

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains(",87.6\n"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_nan_temperature_writes_nothing() {
        let dir = scratch_dir("nan");
        let path = dir.join("temperature.csv");

        let err =
            save_reading(&quiet_logger(), &reading("2024-01-01T00:00:00+00:00", f64::NAN), &path)
                .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(!path.exists(), "a rejected reading must not create the file");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_malformed_timestamp_writes_nothing() {
        let dir = scratch_dir("bad_ts");
        let path = dir.join("temperature.csv");

        let err = save_reading(&quiet_logger(), &reading("yesterday", 21.0), &path).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(!path.exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_bom_file_is_rejected_and_untouched() {
        let dir = scratch_dir("bom");
        let path = dir.join("temperature.csv");
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"timestamp,temperature\n");
        fs::write(&path, &bytes).unwrap();

        let err = save_reading(&quiet_logger(), &reading("2024-01-01T00:00:00+00:00", 21.3), &path)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        assert_eq!(fs::read(&path).unwrap(), bytes, "rejected file must not be modified");
        assert!(!temp_sibling(&path).exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_copy_failure_leaves_original_byte_identical() {
        let dir = scratch_dir("copy_fail");
        let path = dir.join("temperature.csv");
        let logger = quiet_logger();

        save_reading(&logger, &reading("2024-01-01T00:00:00+00:00", 21.3), &path).unwrap();
        let before = fs::read(&path).unwrap();

        // A directory squatting on the temporary path makes the copy step
        // fail, exercising the abort path before the rename.
        fs::create_dir_all(temp_sibling(&path)).unwrap();

        let err = save_reading(&logger, &reading("2024-01-01T01:00:00+00:00", 22.0), &path)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Io(_)), "expected an I/O error, got {:?}", err);

        let after = fs::read(&path).unwrap();
        assert_eq!(before, after, "a failed write must leave the original untouched");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_existing_empty_file_gains_header() {
        let dir = scratch_dir("empty_existing");
        let path = dir.join("temperature.csv");
        fs::write(&path, "").unwrap();

        save_reading(&quiet_logger(), &reading("2024-01-01T00:00:00+00:00", 21.3), &path)
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("timestamp,temperature\n"));
        fs::remove_dir_all(&dir).unwrap();
    }
}
