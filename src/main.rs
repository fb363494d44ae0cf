//! Binary entry point: fetch one reading, persist it, exit.
//!
//! Exit codes: 0 on full success, 1 on any classified failure. Every
//! failure is logged with its kind and a human-readable hint before the
//! process exits; nothing is swallowed.

use std::time::Duration;

use templog_service::config::{self, Config};
use templog_service::ingest::remo;
use templog_service::logging::{Component, LogLevel, Logger, mask_token};
use templog_service::model::{ServiceError, TemperatureReading};
use templog_service::{retry, store, validate};

/// Delay before the first retry; doubles on each subsequent one.
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);

fn main() {
    dotenv::dotenv().ok();
    std::process::exit(run());
}

fn run() -> i32 {
    let config = match config::load() {
        Ok(config) => config,
        Err(e) => {
            Logger::new(LogLevel::Info)
                .error(Component::System, &format!("configuration error: {}", e));
            return 1;
        }
    };

    let mut logger = Logger::new(config.log_level);
    if let Some(ref path) = config.log_file {
        logger = logger.with_file(path);
    }

    logger.info(Component::System, "starting temperature logger");

    let token = match config::api_token() {
        Ok(token) => token,
        Err(e) => {
            report_failure(&logger, &e);
            return 1;
        }
    };

    // From here on every entry passes through redaction, so the token can
    // never leak into the console or the log file.
    let logger = logger.with_redaction(&token);
    logger.debug(
        Component::System,
        &format!("API token loaded: {}", mask_token(&token)),
    );

    match run_pipeline(&logger, &config, &token) {
        Ok(()) => {
            logger.info(Component::System, "temperature logging completed successfully");
            0
        }
        Err(e) => {
            report_failure(&logger, &e);
            1
        }
    }
}

fn run_pipeline(logger: &Logger, config: &Config, token: &str) -> Result<(), ServiceError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| ServiceError::Api(format!("failed to build HTTP client: {}", e)))?;

    logger.info(Component::Remo, "fetching current temperature");
    let celsius = retry::retry_with_backoff(
        logger,
        || remo::fetch_current(&client, token),
        config.max_retries,
        INITIAL_RETRY_DELAY,
        ServiceError::is_retryable,
    )?;
    logger.info(Component::Remo, &format!("temperature retrieved: {}°C", celsius));

    let reading = TemperatureReading::now(celsius);
    logger.debug(
        Component::System,
        &format!("generated timestamp: {}", reading.timestamp),
    );

    // The writer re-runs both checks as hard preconditions; checking here
    // keeps a malformed reading from reaching the filesystem layer at all.
    validate::validate_temperature(reading.celsius)?;
    validate::validate_timestamp(&reading.timestamp)?;

    logger.info(
        Component::Csv,
        &format!("saving reading to {}", config.csv_path.display()),
    );
    store::save_reading(logger, &reading, &config.csv_path)?;

    Ok(())
}

/// Logs a terminal failure with its kind and a recovery hint.
fn report_failure(logger: &Logger, err: &ServiceError) {
    logger.error(Component::System, &err.to_string());

    let hint = match err {
        ServiceError::Auth(_) => "check your NATURE_REMO_TOKEN environment variable",
        ServiceError::Timeout(_) => "the API request timed out; check your network connection",
        ServiceError::Retryable { .. } | ServiceError::Client { .. } | ServiceError::Api(_) => {
            "failed to retrieve temperature data from the device API"
        }
        ServiceError::Validation(_) => "temperature data failed validation",
        ServiceError::Io(_) => "failed to save temperature data to file",
    };
    logger.error(Component::System, hint);
}
