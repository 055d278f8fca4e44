//! In-memory transport for tests
//!
//! Records every request, answers from a script of outcomes and tracks how
//! many sends overlap so tests can assert the single-flight guarantee.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::Transport;
use crate::error::{ErrorLoggerError, ErrorLoggerResult};
use crate::record::KEY_INDEX;

/// Scripted answer for one send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedOutcome {
    Succeed,
    /// Collector answered with this non-2xx status
    Status(u16),
    /// No response at all
    Unreachable,
}

/// One observed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRequest {
    pub index: Option<u64>,
    pub fields: Vec<(String, String)>,
}

impl SentRequest {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Default)]
pub struct RecordingTransport {
    script: Mutex<VecDeque<ScriptedOutcome>>,
    sent: Mutex<Vec<SentRequest>>,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingTransport {
    /// Transport that accepts every request
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport that plays back `outcomes` in order, then accepts everything
    pub fn scripted(outcomes: impl IntoIterator<Item = ScriptedOutcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Hold every send open for `latency` before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queue more scripted outcomes
    pub fn push_outcomes(&self, outcomes: impl IntoIterator<Item = ScriptedOutcome>) {
        self.script.lock().extend(outcomes);
    }

    pub fn requests(&self) -> Vec<SentRequest> {
        self.sent.lock().clone()
    }

    pub fn sent_indices(&self) -> Vec<u64> {
        self.sent.lock().iter().filter_map(|r| r.index).collect()
    }

    pub fn call_count(&self) -> usize {
        self.sent.lock().len()
    }

    /// Highest number of sends ever observed running at the same time
    pub fn max_concurrent(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, fields: &[(String, String)]) -> ErrorLoggerResult<()> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let request = SentRequest {
            index: fields
                .iter()
                .find(|(k, _)| k == KEY_INDEX)
                .and_then(|(_, v)| v.parse().ok()),
            fields: fields.to_vec(),
        };
        self.sent.lock().push(request);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        } else {
            tokio::task::yield_now().await;
        }

        let outcome = self
            .script
            .lock()
            .pop_front()
            .unwrap_or(ScriptedOutcome::Succeed);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match outcome {
            ScriptedOutcome::Succeed => Ok(()),
            ScriptedOutcome::Status(status) => Err(ErrorLoggerError::UnexpectedStatus {
                endpoint: "recording".to_string(),
                status,
            }),
            ScriptedOutcome::Unreachable => Err(ErrorLoggerError::Timeout {
                operation: "recording send".to_string(),
                duration: self.latency.unwrap_or_default(),
            }),
        }
    }
}
