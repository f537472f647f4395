use std::time::Duration;

use tracing::{debug, error, warn};

use crate::error::FailureKind;
use crate::transformer::Transformer;

/// Calls a [`Transformer`] with a fixed attempt budget.
///
/// Errors and empty responses each consume one attempt. Nothing raised by the service escapes:
/// the caller gets either text or [`FailureKind::Exhausted`], and decides what to persist.
pub struct RetryExecutor<T: Transformer> {
    transformer: T,
    max_attempts: u32,
    delay: Duration,
}

impl<T: Transformer> RetryExecutor<T> {
    /// `max_attempts` is clamped to at least one.
    pub fn new(transformer: T, max_attempts: u32) -> Self {
        Self {
            transformer,
            max_attempts: max_attempts.max(1),
            delay: Duration::ZERO,
        }
    }

    /// Sleep for `delay` between attempts on the same item.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn transformer(&self) -> &T {
        &self.transformer
    }

    /// Transform `text`, returning the first non-empty response.
    ///
    /// `item` only labels the log events.
    pub fn transform(&self, item: &str, prompt: &str, text: &str) -> Result<String, FailureKind> {
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            if attempt > 1 && !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }

            match self.transformer.complete(prompt, text) {
                Ok(out) if !out.trim().is_empty() => {
                    debug!(
                        item,
                        attempt,
                        max_attempts = self.max_attempts,
                        "transform succeeded"
                    );
                    return Ok(out);
                }
                Ok(_) => {
                    last_error = "service returned empty text".to_string();
                    warn!(
                        item,
                        attempt,
                        max_attempts = self.max_attempts,
                        "transform returned empty text"
                    );
                }
                Err(err) => {
                    last_error = format!("{err:#}");
                    warn!(
                        item,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %last_error,
                        "transform attempt failed"
                    );
                }
            }
        }

        error!(
            item,
            attempts = self.max_attempts,
            error = %last_error,
            "transform retries exhausted"
        );
        Err(FailureKind::Exhausted {
            attempts: self.max_attempts,
            last_error,
        })
    }
}
