//! Bounded retry with capped exponential backoff.
//!
//! Only errors that report themselves as transient are retried; permanent
//! failures return on the first attempt.

use std::fmt::Display;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::config::{ConfigError, parsed};

/// Classifies an error as worth retrying.
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first one.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Reads `RETRY_*` through `lookup`; unset or blank variables keep the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let d = Self::default();
        Ok(Self {
            max_attempts: parsed(
                lookup("RETRY_MAX_ATTEMPTS"),
                "RETRY_MAX_ATTEMPTS",
                "an attempt count from 1 to 20",
                |s| s.parse::<u32>().ok().filter(|&n| n > 0 && n <= 20),
            )?
            .unwrap_or(d.max_attempts),
            base_delay_ms: parsed(
                lookup("RETRY_BASE_DELAY_MS"),
                "RETRY_BASE_DELAY_MS",
                "a positive number of milliseconds",
                |s| s.parse::<u64>().ok().filter(|&n| n > 0),
            )?
            .unwrap_or(d.base_delay_ms),
            max_delay_ms: parsed(
                lookup("RETRY_MAX_DELAY_MS"),
                "RETRY_MAX_DELAY_MS",
                "a positive number of milliseconds",
                |s| s.parse::<u64>().ok().filter(|&n| n > 0),
            )?
            .unwrap_or(d.max_delay_ms),
        })
    }

    /// `min(max_delay, base_delay * 2^(attempt-1))`.
    pub fn backoff_ceiling_ms(&self, attempt: u32) -> u64 {
        let exponent = attempt.saturating_sub(1);
        let multiplier = if exponent >= 63 {
            u64::MAX
        } else {
            1u64 << exponent
        };
        self.base_delay_ms
            .saturating_mul(multiplier)
            .min(self.max_delay_ms)
    }

    /// Ceiling with jitter drawn from its upper half.
    pub fn backoff_ms(&self, attempt: u32) -> u64 {
        let ceiling = self.backoff_ceiling_ms(attempt);
        let floor = ceiling / 2;
        if ceiling == floor {
            return ceiling;
        }
        rand::thread_rng().gen_range(floor..=ceiling)
    }

    pub fn run<T, E>(&self, label: &str, op: impl FnMut() -> Result<T, E>) -> Result<T, E>
    where
        E: Retryable + Display,
    {
        self.run_with_sleep(label, op, std::thread::sleep)
    }

    /// As [`RetryPolicy::run`], with the sleep injected.
    pub fn run_with_sleep<T, E>(
        &self,
        label: &str,
        mut op: impl FnMut() -> Result<T, E>,
        mut sleep: impl FnMut(Duration),
    ) -> Result<T, E>
    where
        E: Retryable + Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1u32;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    let delay = self.backoff_ms(attempt);
                    warn!(
                        target: "retry",
                        label,
                        attempt,
                        max_attempts,
                        delay_ms = delay,
                        error = %err,
                        "transient failure, retrying"
                    );
                    sleep(Duration::from_millis(delay));
                    attempt += 1;
                }
                Err(err) => {
                    debug!(target: "retry", label, attempt, transient = err.is_transient(), "giving up");
                    return Err(err);
                }
            }
        }
    }
}
