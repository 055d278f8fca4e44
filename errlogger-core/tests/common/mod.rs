// Common helpers for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use errlogger_core::transport::RecordingTransport;
use errlogger_core::{ErrorLogger, LoggerConfig};

pub const TEST_ENDPOINT: &str = "http://collector.test/errors";
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Config pointing at the test endpoint with a fixed page URL
pub fn test_config() -> LoggerConfig {
    let mut config = LoggerConfig::new(TEST_ENDPOINT);
    config.page_url = Some("https://app.test/checkout".to_string());
    config
}

/// Logger on the current runtime backed by `transport`
pub fn test_logger(transport: &Arc<RecordingTransport>) -> ErrorLogger {
    ErrorLogger::new(&test_config(), transport.clone()).expect("runtime is available in tests")
}
