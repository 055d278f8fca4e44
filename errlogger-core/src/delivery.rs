//! Serial delivery of queued errors
//!
//! [`ErrorLogger`] owns a [`DeliveryQueue`] and drains it through a
//! [`Transport`] one record at a time. The loop has two states:
//!
//! ```text
//!            write / completion, head present
//!   ┌──────┐ ───────────────────────────────▶ ┌─────────┐
//!   │ Idle │                                  │ Sending │
//!   └──────┘ ◀─────────────────────────────── └─────────┘
//!              success: remove head by index
//!              failure: keep head, resend
//! ```
//!
//! Every accepted write and every send completion re-evaluates the `Idle ->
//! Sending` edge. The edge is only taken when the state is `Idle` and the
//! queue has a head, which is what keeps at most one record in flight. A
//! record leaves the queue only when its own send succeeded, so delivery is
//! in strict index order and a failed record is retried before any younger
//! one is attempted.
//!
//! `write` never blocks on the network: the send itself runs on the tokio
//! runtime captured when the logger was built.

use futures::FutureExt;
use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, info, warn, Instrument};

use crate::config::{LoggerConfig, RetryConfig};
use crate::error::{ErrorLoggerError, ErrorLoggerResult};
use crate::observability::delivery_span;
use crate::queue::DeliveryQueue;
use crate::record::{CapturedError, ErrorRecord, RecordEnvelope};
use crate::transport::{HttpTransport, Transport};

/// State of the delivery loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Idle,
    Sending,
}

/// Counters describing what the logger has done so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub accepted: u64,
    pub filtered: u64,
    pub delivered: u64,
    pub failed_attempts: u64,
    pub evicted: u64,
}

tokio::task_local! {
    static DELIVERING: ();
}

/// Whether the caller is running inside a delivery attempt
pub(crate) fn in_delivery() -> bool {
    DELIVERING.try_with(|_| ()).is_ok()
}

struct Shared {
    queue: DeliveryQueue,
    state: DeliveryState,
    consecutive_failures: u32,
    stats: DeliveryStats,
}

struct Inner {
    shared: Mutex<Shared>,
    transport: Arc<dyn Transport>,
    retry: RetryConfig,
    max_queue_len: Option<usize>,
    runtime: Handle,
    drained: Notify,
}

/// Handle to a running error logger. Cloning is cheap and shares the queue.
#[derive(Clone)]
pub struct ErrorLogger {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ErrorLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.inner.shared.lock();
        f.debug_struct("ErrorLogger")
            .field("state", &shared.state)
            .field("pending", &shared.queue.len())
            .field("next_index", &shared.queue.next_index())
            .finish()
    }
}

impl ErrorLogger {
    /// Build a logger on the current tokio runtime
    pub fn new(config: &LoggerConfig, transport: Arc<dyn Transport>) -> ErrorLoggerResult<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            ErrorLoggerError::internal(format!("error logger needs a tokio runtime: {}", e))
        })?;
        Ok(Self::with_runtime(config, transport, runtime))
    }

    /// Build a logger that spawns its sends on `runtime`
    pub fn with_runtime(
        config: &LoggerConfig,
        transport: Arc<dyn Transport>,
        runtime: Handle,
    ) -> Self {
        let shared = Shared {
            queue: DeliveryQueue::new(RecordEnvelope::from_config(config)),
            state: DeliveryState::Idle,
            consecutive_failures: 0,
            stats: DeliveryStats::default(),
        };

        Self {
            inner: Arc::new(Inner {
                shared: Mutex::new(shared),
                transport,
                retry: config.retry.clone(),
                max_queue_len: config.max_queue_len,
                runtime,
                drained: Notify::new(),
            }),
        }
    }

    /// Build an HTTP-backed logger, or `None` when no endpoint is configured
    pub fn from_config(config: &LoggerConfig) -> ErrorLoggerResult<Option<Self>> {
        if !config.is_enabled() {
            debug!("No endpoint configured, error logger disabled");
            return Ok(None);
        }

        config.validate()?;
        let Some(transport) = HttpTransport::from_config(config)? else {
            return Ok(None);
        };
        Self::new(config, Arc::new(transport)).map(Some)
    }

    /// Queue a captured error and kick the delivery loop.
    ///
    /// Returns the index assigned to the record, or `None` if it was filtered out.
    pub fn write(&self, captured: CapturedError) -> Option<u64> {
        let index = {
            let mut shared = self.inner.shared.lock();
            let index = shared.queue.write(captured);

            match index {
                Some(_) => shared.stats.accepted += 1,
                None => shared.stats.filtered += 1,
            }

            if let (Some(_), Some(max_len)) = (index, self.inner.max_queue_len) {
                let in_flight = match shared.state {
                    DeliveryState::Sending => shared.queue.read().map(ErrorRecord::index),
                    DeliveryState::Idle => None,
                };
                let evicted = shared.queue.evict_overflow(max_len, in_flight);
                if !evicted.is_empty() {
                    shared.stats.evicted += evicted.len() as u64;
                    warn!(?evicted, max_len, "Error queue full, dropped oldest unsent records");
                }
            }

            index
        };

        if index.is_some() {
            Inner::pump(&self.inner);
        }
        index
    }

    /// Record an error from its raw capture-site fields
    pub fn add_error(
        &self,
        message: Option<&str>,
        source: Option<&str>,
        line: Option<u32>,
        column: Option<u32>,
    ) -> Option<u64> {
        self.write(CapturedError {
            message: message.map(str::to_string),
            source: source.map(str::to_string),
            line,
            column,
            ..CapturedError::default()
        })
    }

    pub fn state(&self) -> DeliveryState {
        self.inner.shared.lock().state
    }

    /// Indices of records not yet acknowledged
    pub fn pending(&self) -> Vec<u64> {
        self.inner.shared.lock().queue.pending()
    }

    pub fn stats(&self) -> DeliveryStats {
        self.inner.shared.lock().stats
    }

    /// Wait until every queued record has been delivered
    pub async fn flush(&self) {
        loop {
            let notified = self.inner.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.inner.is_drained() {
                return;
            }
            notified.await;
        }
    }

    /// Like [`flush`](Self::flush) but gives up after `timeout`
    pub async fn flush_timeout(&self, timeout: Duration) -> ErrorLoggerResult<()> {
        tokio::time::timeout(timeout, self.flush())
            .await
            .map_err(|_| ErrorLoggerError::Timeout {
                operation: "flush".to_string(),
                duration: timeout,
            })
    }
}

impl Inner {
    fn is_drained(&self) -> bool {
        let shared = self.shared.lock();
        shared.state == DeliveryState::Idle && shared.queue.is_empty()
    }

    /// Take the `Idle -> Sending` edge if possible
    fn pump(inner: &Arc<Inner>) {
        let (record, failures) = {
            let mut shared = inner.shared.lock();
            if shared.state != DeliveryState::Idle {
                return;
            }

            let Some(record) = shared.queue.read().cloned() else {
                drop(shared);
                inner.drained.notify_waiters();
                return;
            };

            shared.state = DeliveryState::Sending;
            (record, shared.consecutive_failures)
        };

        let task = Arc::clone(inner);
        inner.runtime.spawn(async move {
            task.deliver(record, failures).await;
        });
    }

    async fn deliver(self: Arc<Self>, record: ErrorRecord, failures: u32) {
        let index = record.index();
        let attempt = failures.saturating_add(1);
        let span = delivery_span(index, attempt);

        // backoff and send both run under the guard so the state always returns to Idle
        let attempt_future = async {
            if failures > 0 {
                let delay = self.retry.delay_for(failures);
                if !delay.is_zero() {
                    debug!(index, ?delay, "Backing off before resend");
                    tokio::time::sleep(delay).await;
                }
            }
            self.transport.send(record.fields()).await
        };

        let result = DELIVERING
            .scope((), AssertUnwindSafe(attempt_future).catch_unwind())
            .instrument(span.clone())
            .await
            .unwrap_or_else(|_| Err(ErrorLoggerError::internal("delivery attempt panicked")));

        {
            let mut shared = self.shared.lock();
            match result {
                Ok(()) => {
                    span.record("outcome", "delivered");
                    if shared.queue.remove(index) {
                        shared.stats.delivered += 1;
                    }
                    shared.consecutive_failures = 0;
                    info!(index, attempt, "Error record delivered");
                }
                Err(e) => {
                    span.record("outcome", "failed");
                    shared.consecutive_failures = shared.consecutive_failures.saturating_add(1);
                    shared.stats.failed_attempts += 1;
                    warn!(index, attempt, error = %e, "Error record delivery failed, will resend");
                }
            }
            shared.state = DeliveryState::Idle;
        }

        Inner::pump(&self);
    }
}
