//! Retry pacing configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::backoff::{BackoffStrategy, JitterStrategy};
use crate::error::{ErrorLoggerError, ErrorLoggerResult};

/// How long to wait before resending a record that failed to deliver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RetryConfig {
    pub backoff: BackoffStrategy,
    pub jitter: JitterStrategy,
}

impl RetryConfig {
    /// Resend failed records immediately
    pub fn immediate() -> Self {
        Self::default()
    }

    /// Capped exponential backoff with proportional jitter
    pub fn hardened() -> Self {
        Self {
            backoff: BackoffStrategy::capped_exponential(),
            jitter: JitterStrategy::ProportionalRange { min: 0.8, max: 1.2 },
        }
    }

    /// Delay to apply after `failures` consecutive failures of the same record.
    ///
    /// Jitter never pushes the delay past the backoff's own cap.
    pub fn delay_for(&self, failures: u32) -> Duration {
        let delay = self.jitter.apply(self.backoff.delay(failures));
        match self.backoff.cap() {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }

    pub fn validate(&self) -> ErrorLoggerResult<()> {
        if let BackoffStrategy::Exponential {
            base,
            max,
            multiplier,
        } = &self.backoff
        {
            if !multiplier.is_finite() || *multiplier < 1.0 {
                return Err(ErrorLoggerError::configuration(
                    "retry.backoff.multiplier",
                    "must be a finite number >= 1.0",
                ));
            }
            if base > max {
                return Err(ErrorLoggerError::configuration(
                    "retry.backoff",
                    "base delay cannot exceed max delay",
                ));
            }
        }

        if let JitterStrategy::ProportionalRange { min, max } = &self.jitter {
            if !min.is_finite() || !max.is_finite() || *min < 0.0 || min > max {
                return Err(ErrorLoggerError::configuration(
                    "retry.jitter",
                    "range must be finite and satisfy 0 <= min <= max",
                ));
            }
        }

        Ok(())
    }
}
