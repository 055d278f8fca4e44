//! Delay policy between retries of the head record
//!
//! Delivery retries the same record until it succeeds. By default the
//! resend is immediate; a capped backoff can be configured to keep a dead
//! collector from being hammered. Either way the record being retried is
//! the same one, only the wait before the next attempt changes.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff strategy applied after a failed send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Resend as soon as the failure is observed
    Immediate,
    /// Fixed delay between retries
    Fixed {
        #[serde(with = "humantime_serde")]
        delay: Duration,
    },
    /// Exponential increase in delay (base * multiplier^(failures - 1)), capped at `max`
    Exponential {
        #[serde(with = "humantime_serde")]
        base: Duration,
        #[serde(with = "humantime_serde")]
        max: Duration,
        multiplier: f64,
    },
}

impl BackoffStrategy {
    /// Delay before the next attempt after `failures` consecutive failures
    pub fn delay(&self, failures: u32) -> Duration {
        match self {
            BackoffStrategy::Immediate => Duration::ZERO,

            BackoffStrategy::Fixed { delay } => *delay,

            BackoffStrategy::Exponential {
                base,
                max,
                multiplier,
            } => {
                let factor = multiplier.powf(failures.saturating_sub(1) as f64);
                let delay_ms = base.as_millis() as f64 * factor;
                if !delay_ms.is_finite() || delay_ms >= max.as_millis() as f64 {
                    return *max;
                }
                std::cmp::min(Duration::from_millis(delay_ms as u64), *max)
            }
        }
    }

    /// Upper bound on any delay this strategy produces, jitter included
    pub fn cap(&self) -> Option<Duration> {
        match self {
            BackoffStrategy::Exponential { max, .. } => Some(*max),
            BackoffStrategy::Immediate | BackoffStrategy::Fixed { .. } => None,
        }
    }

    /// Capped exponential backoff suitable for a flaky collector
    pub fn capped_exponential() -> Self {
        BackoffStrategy::Exponential {
            base: Duration::from_millis(crate::config::DEFAULT_BACKOFF_BASE_MS),
            max: Duration::from_secs(crate::config::DEFAULT_BACKOFF_MAX_SECS),
            multiplier: crate::config::DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        BackoffStrategy::Immediate
    }
}

/// Jitter applied on top of the computed delay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JitterStrategy {
    /// No jitter applied
    None,
    /// Multiply the delay by a random factor in `min..max`
    ProportionalRange { min: f64, max: f64 },
    /// Random delay between 0 and the calculated delay
    Full,
}

impl Default for JitterStrategy {
    fn default() -> Self {
        JitterStrategy::None
    }
}

impl JitterStrategy {
    /// Apply this jitter to a base delay
    pub fn apply(&self, base_delay: Duration) -> Duration {
        if base_delay.is_zero() {
            return base_delay;
        }

        let mut rng = rand::thread_rng();
        match self {
            JitterStrategy::None => base_delay,

            JitterStrategy::ProportionalRange { min, max } => {
                if !min.is_finite() || !max.is_finite() || min >= max {
                    return base_delay;
                }
                let factor = rng.gen_range(*min..*max);
                Duration::from_millis((base_delay.as_millis() as f64 * factor) as u64)
            }

            JitterStrategy::Full => {
                let max_delay_ms = base_delay.as_millis() as u64;
                Duration::from_millis(rng.gen_range(0..=max_delay_ms))
            }
        }
    }
}
