//! Default configuration values for errlogger

use std::time::Duration;

// Transport defaults
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

// Retry defaults (only used when backoff is switched on)
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 100;
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 30;
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

// Environment variables
pub const ENV_ENDPOINT_URL: &str = "ERRLOGGER_ENDPOINT_URL";
pub const ENV_PAGE_URL: &str = "ERRLOGGER_PAGE_URL";
pub const ENV_PARAMS: &str = "ERRLOGGER_PARAMS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "ERRLOGGER_REQUEST_TIMEOUT_SECS";
pub const ENV_MAX_QUEUE_LEN: &str = "ERRLOGGER_MAX_QUEUE_LEN";

pub const fn duration_secs(secs: u64) -> Duration {
    Duration::from_secs(secs)
}
