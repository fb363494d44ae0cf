//! Exponential-backoff retry execution.
//!
//! Wraps any zero-argument fallible operation and re-runs it while the
//! injected classifier reports the failure as transient. The executor knows
//! nothing about HTTP or this service's error enum — callers pass the
//! operation, the attempt budget, and the classifier, which keeps the whole
//! thing unit-testable without network access.
//!
//! # Sleep injection
//! `retry_with_backoff_using` accepts the sleep function as a parameter
//! rather than calling `thread::sleep` internally. This makes the backoff
//! schedule purely deterministic in tests without time manipulation; the
//! `retry_with_backoff` wrapper supplies the real sleep.

use std::time::Duration;

use crate::logging::{Component, Logger};

/// Executes `operation` up to `max_attempts` times with exponential backoff.
///
/// Semantics:
/// - success returns immediately;
/// - a failure the classifier rejects propagates immediately, with no
///   further attempts and no sleeping;
/// - a retryable failure sleeps `initial_delay * 2^k` (k = zero-based index
///   of the failed attempt) before the next try, with no jitter;
/// - once the budget is exhausted, the last failure propagates unchanged.
///
/// A budget of 0 is treated as 1 — the operation always runs at least once.
/// Every retry is logged at WARN and every terminal failure at ERROR.
pub fn retry_with_backoff<T, E, F, C>(
    logger: &Logger,
    operation: F,
    max_attempts: u32,
    initial_delay: Duration,
    is_retryable: C,
) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    C: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    retry_with_backoff_using(
        logger,
        operation,
        max_attempts,
        initial_delay,
        is_retryable,
        std::thread::sleep,
    )
}

/// Same as [`retry_with_backoff`], with the sleep function injected.
/// Use this in tests to record the backoff schedule deterministically.
pub fn retry_with_backoff_using<T, E, F, C, S>(
    logger: &Logger,
    mut operation: F,
    max_attempts: u32,
    initial_delay: Duration,
    is_retryable: C,
    mut sleep: S,
) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    C: Fn(&E) -> bool,
    S: FnMut(Duration),
    E: std::fmt::Display,
{
    let budget = max_attempts.max(1);
    let mut attempt: u32 = 0;

    loop {
        match operation() {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;

                if !is_retryable(&err) {
                    logger.error(
                        Component::System,
                        &format!("non-retryable failure on attempt {}: {}", attempt, err),
                    );
                    return Err(err);
                }

                if attempt >= budget {
                    logger.error(
                        Component::System,
                        &format!("all {} attempts failed; last failure: {}", budget, err),
                    );
                    return Err(err);
                }

                // Zero-based index of the attempt that just failed.
                let exponent = attempt - 1;
                let delay = initial_delay.saturating_mul(2u32.saturating_pow(exponent));

                logger.warn(
                    Component::System,
                    &format!(
                        "retryable failure: {}. attempt {}/{}, retrying after {:?}",
                        err, attempt, budget, delay
                    ),
                );
                sleep(delay);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
