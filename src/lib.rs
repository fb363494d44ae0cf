//! Temperature logging service.
//!
//! Fetches one temperature reading from the Nature Remo cloud API —
//! retrying transient failures with exponential backoff — validates it, and
//! appends it with a timestamp to a local CSV file through an
//! atomic-replace write. One process, one run, one network call, one file
//! write, then exit.
//!
//! Module map:
//! - [`model`] — domain types and the service-wide error enum
//! - [`config`] — environment-variable configuration
//! - [`logging`] — leveled logger with credential redaction
//! - [`ingest`] — the Nature Remo API client
//! - [`retry`] — generic exponential-backoff executor
//! - [`validate`] — temperature / timestamp / CSV-format checks
//! - [`store`] — the durable CSV writer
//!
//! Concurrent invocations against the same CSV path are not guarded
//! against; see the `store` module docs for the exact semantics.

pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod retry;
pub mod store;
pub mod validate;
