//! Delivery transports
//!
//! The delivery loop only needs one capability from the outside world:
//! hand over a record's key/value pairs and learn whether the collector
//! accepted them. Anything that implements [`Transport`] can be plugged in.

use async_trait::async_trait;

use crate::error::ErrorLoggerResult;

pub mod http;
#[cfg(any(test, feature = "test-helpers"))]
pub mod recording;

pub use http::{encode_form, HttpTransport};
#[cfg(any(test, feature = "test-helpers"))]
pub use recording::{RecordingTransport, ScriptedOutcome, SentRequest};

/// Sends one record to a collector
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver the fields of a single record.
    ///
    /// `Ok(())` acknowledges the record; any error means it must be sent again.
    async fn send(&self, fields: &[(String, String)]) -> ErrorLoggerResult<()>;
}
