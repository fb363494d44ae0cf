//! Environment-variable configuration.
//!
//! All tuning knobs come from the process environment (optionally seeded
//! from a `.env` file by `main` via dotenv). Loaded once per run; the
//! resulting `Config` is immutable thereafter.

use std::env;
use std::path::PathBuf;

use crate::logging::LogLevel;
use crate::model::ServiceError;

/// Name of the CSV file created under `OUTPUT_DIR`.
const CSV_FILE_NAME: &str = "temperature.csv";

/// Environment variable holding the Nature Remo bearer token.
const TOKEN_VAR: &str = "NATURE_REMO_TOKEN";

/// Runtime configuration, resolved from the environment with defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Full path of the CSV file readings are appended to.
    pub csv_path: PathBuf,
    /// Deadline for the single API request, in seconds.
    pub timeout_secs: u64,
    /// Total attempt budget for the retry executor.
    pub max_retries: u32,
    /// Minimum level emitted by the logger.
    pub log_level: LogLevel,
    /// Optional file the logger appends to in addition to the console.
    pub log_file: Option<String>,
}

/// Loads configuration from the environment.
///
/// Missing variables fall back to defaults; present-but-malformed numeric
/// values are a Validation error rather than being silently replaced.
pub fn load() -> Result<Config, ServiceError> {
    let output_dir = env::var("OUTPUT_DIR").unwrap_or_else(|_| "data".to_string());

    let timeout_secs = parse_env_u64("API_TIMEOUT", 30)?;
    let max_retries = parse_env_u32("MAX_RETRIES", 3)?;

    let log_level = env::var("LOG_LEVEL")
        .map(|name| LogLevel::from_name(&name))
        .unwrap_or(LogLevel::Info);

    Ok(Config {
        csv_path: PathBuf::from(output_dir).join(CSV_FILE_NAME),
        timeout_secs,
        max_retries,
        log_level,
        log_file: env::var("LOG_FILE").ok(),
    })
}

/// Reads the API bearer token. Its absence (or an empty value) is an
/// authentication failure — there is no anonymous access to the device API.
pub fn api_token() -> Result<String, ServiceError> {
    match env::var(TOKEN_VAR) {
        Ok(token) if !token.is_empty() => Ok(token),
        _ => Err(ServiceError::Auth(format!(
            "{} environment variable not set",
            TOKEN_VAR
        ))),
    }
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ServiceError> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| {
            ServiceError::Validation(format!("{} must be an integer, got '{}'", name, raw))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u32(name: &str, default: u32) -> Result<u32, ServiceError> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| {
            ServiceError::Validation(format!("{} must be an integer, got '{}'", name, raw))
        }),
        Err(_) => Ok(default),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
//
// Environment variables are process-global, so these tests each use their
// own variable names via the parse helpers instead of mutating the shared
// OUTPUT_DIR/API_TIMEOUT set concurrently with other tests.
