//! Capture uncaught errors and ship them to a collector
//!
//! Captured errors are filtered, queued in memory and delivered one at a
//! time, in capture order, to an HTTP endpoint. Failed sends are retried
//! with the same record until the collector accepts it.
//!
//! ```no_run
//! use errlogger_core::{config::LoggerConfig, ErrorLogger};
//!
//! # async fn run() -> errlogger_core::error::ErrorLoggerResult<()> {
//! let config = LoggerConfig::from_env()?;
//! if let Some(logger) = ErrorLogger::install(&config)? {
//!     // panics are now reported; errors can also be written directly
//!     logger.add_error(Some("startup check failed"), Some("main.rs"), Some(12), None);
//!     logger.flush().await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod backoff;
pub mod config;
pub mod delivery;
pub mod error;
pub mod filter;
pub mod observability;
pub mod observer;
pub mod queue;
pub mod record;
pub mod transport;

pub use config::{LoggerConfig, LoggerConfigBuilder, RetryConfig};
pub use delivery::{DeliveryState, DeliveryStats, ErrorLogger};
pub use error::{ErrorLoggerError, ErrorLoggerResult};
pub use filter::ErrorFilter;
pub use observer::{install_panic_hook, ErrorObserverRegistry, ObserverId};
pub use queue::DeliveryQueue;
pub use record::{CapturedError, ErrorRecord, RecordEnvelope};
pub use transport::{HttpTransport, Transport};
