//! Structured logging for the temperature logging service.
//!
//! Provides context-rich logging with component tags, timestamps, and
//! severity levels. Supports both console output and file-based logging.
//!
//! The logger is an explicit value handed to each component rather than a
//! process-wide singleton, so tests can construct their own quiet instances.
//! Credential redaction happens in one place — the sink — as a pure string
//! transform, never scattered through call sites.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl LogLevel {
    /// Parses a level name as found in the `LOG_LEVEL` environment variable.
    /// Unknown names fall back to `Info` rather than failing the run.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "DEBUG" => LogLevel::Debug,
            "WARN" | "WARNING" => LogLevel::Warning,
            "ERROR" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

// ---------------------------------------------------------------------------
// Component tags
// ---------------------------------------------------------------------------

/// Which part of the pipeline produced a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// Nature Remo API client and the retry wrapper around it.
    Remo,
    /// CSV validation and persistence.
    Csv,
    /// Configuration, startup, and everything else.
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Remo => write!(f, "REMO"),
            Component::Csv => write!(f, "CSV"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Redaction
// ---------------------------------------------------------------------------

/// Replaces every occurrence of `token` in `message` with `[REDACTED]`.
/// Pure; applied once at the sink.
pub fn redact(message: &str, token: &str) -> String {
    if token.is_empty() {
        return message.to_string();
    }
    message.replace(token, "[REDACTED]")
}

/// Masks an API token for safe display: first and last four characters
/// visible (`abcd***wxyz`), or `***` when the token is too short to
/// partially reveal.
pub fn mask_token(token: &str) -> String {
    if token.is_empty() {
        return String::new();
    }
    if token.len() <= 8 {
        return "***".to_string();
    }
    format!("{}***{}", &token[..4], &token[token.len() - 4..])
}

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

pub struct Logger {
    /// Minimum log level to emit.
    min_level: LogLevel,
    /// Optional file path; entries are appended in addition to the console.
    log_file: Option<String>,
    /// Credential to scrub from every entry before it reaches any sink.
    secret: Option<String>,
}

impl Logger {
    pub fn new(min_level: LogLevel) -> Self {
        Self { min_level, log_file: None, secret: None }
    }

    /// Also append entries to the given file.
    pub fn with_file(mut self, path: &str) -> Self {
        self.log_file = Some(path.to_string());
        self
    }

    /// Register a credential to redact from all future entries.
    pub fn with_redaction(mut self, secret: &str) -> Self {
        self.secret = Some(secret.to_string());
        self
    }

    pub fn log(&self, level: LogLevel, component: Component, context: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let message = match &self.secret {
            Some(secret) => redact(message, secret),
            None => message.to_string(),
        };

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let context_part = context.map(|c| format!(" [{}]", c)).unwrap_or_default();
        let entry = format!("{} {} {}{}: {}", timestamp, level, component, context_part, message);

        match level {
            LogLevel::Error | LogLevel::Warning => eprintln!("{}", entry),
            LogLevel::Info | LogLevel::Debug => println!("{}", entry),
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    pub fn debug(&self, component: Component, message: &str) {
        self.log(LogLevel::Debug, component, None, message);
    }

    pub fn info(&self, component: Component, message: &str) {
        self.log(LogLevel::Info, component, None, message);
    }

    pub fn warn(&self, component: Component, message: &str) {
        self.log(LogLevel::Warning, component, None, message);
    }

    pub fn error(&self, component: Component, message: &str) {
        self.log(LogLevel::Error, component, None, message);
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
