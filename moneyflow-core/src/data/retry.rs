//! Fixed-delay retry for calls against external services.
//!
//! Attempts are sequential and the delay blocks the calling thread. There is
//! no backoff growth: every gap between attempts is the same `delay`.

use super::provider::SourceError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

/// A call that failed on every attempt.
#[derive(Debug)]
pub struct Exhausted {
    pub attempts: u32,
    pub last_error: SourceError,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Sheet reads: 3 attempts, 5 s apart.
    pub fn sheet_read() -> Self {
        Self::new(3, Duration::from_secs(5))
    }

    /// Artifact publication: 3 attempts, 10 s apart.
    pub fn publish() -> Self {
        Self::new(3, Duration::from_secs(10))
    }

    /// No waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    /// Run `op` until it succeeds or the attempt budget is spent.
    ///
    /// `op` receives the 1-based attempt number. On success returns the value
    /// together with the number of attempts used.
    pub fn run<T, F>(&self, label: &str, mut op: F) -> Result<(T, u32), Exhausted>
    where
        F: FnMut(u32) -> Result<T, SourceError>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            if attempt > 1 && !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }

            match op(attempt) {
                Ok(value) => return Ok((value, attempt)),
                Err(e) => {
                    tracing::warn!(
                        op = label,
                        attempt,
                        max_attempts = attempts,
                        error = %e,
                        "attempt failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(Exhausted {
            attempts,
            last_error: last_error
                .unwrap_or_else(|| SourceError::Other("max retries exceeded".into())),
        })
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::sheet_read()
    }
}
