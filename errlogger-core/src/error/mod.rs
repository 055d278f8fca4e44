//! Error handling for errlogger
//!
//! Errors from this crate only ever surface on the setup path: loading and
//! validating configuration, building a transport, installing the capture
//! hook. Once a logger is running, delivery failures are absorbed by the
//! retry loop and reported through `tracing`, never returned to the code
//! that captured the error.
//!
//! ## Error Categories
//!
//! - **Configuration**: missing or malformed settings
//! - **Transport**: HTTP client construction or request failures
//! - **Hook**: capture hook installation
//! - **IO / Parse**: reading and decoding configuration files

pub mod constructors;
pub mod conversions;
pub mod types;

pub use types::{ErrorLoggerError, ErrorLoggerResult, Result};
