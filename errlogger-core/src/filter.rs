//! Noise filtering for captured errors
//!
//! Browsers hide the details of errors thrown by cross-origin scripts and
//! report a fixed `Script error.` message instead. Those reports carry no
//! information, so they never enter the queue.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::record::CapturedError;

static OPAQUE_SENTINEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Script error\.?$").expect("opaque sentinel pattern is valid")
});

static WRAPPED_OPAQUE_SENTINEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Javascript error: Script error\.").expect("wrapped sentinel pattern is valid")
});

/// Stateless accept/reject decision for captured errors
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorFilter;

impl ErrorFilter {
    pub fn new() -> Self {
        Self
    }

    /// Returns false for opaque cross-origin errors, true for everything else
    pub fn accept(&self, candidate: &CapturedError) -> bool {
        let Some(message) = candidate.message.as_deref() else {
            return true;
        };

        if OPAQUE_SENTINEL.is_match(message) {
            return false;
        }

        // same opaque error surfaced through a wrapper, which reports line 0
        !(WRAPPED_OPAQUE_SENTINEL.is_match(message) && candidate.line == Some(0))
    }
}
