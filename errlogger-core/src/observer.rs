//! Capture hook plumbing
//!
//! The process-wide panic hook is a single global slot. Rather than having
//! every interested party overwrite it, the hook is installed once and fans
//! out to an ordered list of observers held in an [`ErrorObserverRegistry`].
//! Whatever hook was installed before ours keeps running, and runs first.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::Any;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::delivery::ErrorLogger;
use crate::error::{ErrorLoggerError, ErrorLoggerResult};
use crate::record::CapturedError;

/// Callback invoked for every captured error
pub type ErrorObserver = Arc<dyn Fn(&CapturedError) + Send + Sync>;

/// Handle returned by [`ErrorObserverRegistry::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Ordered list of error observers
#[derive(Default)]
pub struct ErrorObserverRegistry {
    observers: RwLock<Vec<(ObserverId, ErrorObserver)>>,
    next_id: AtomicU64,
}

static GLOBAL_REGISTRY: Lazy<ErrorObserverRegistry> = Lazy::new(ErrorObserverRegistry::new);
static PANIC_HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

impl ErrorObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry fed by the process panic hook
    pub fn global() -> &'static ErrorObserverRegistry {
        &GLOBAL_REGISTRY
    }

    /// Add an observer; observers run in registration order
    pub fn register<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&CapturedError) + Send + Sync + 'static,
    {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.write().push((id, Arc::new(observer)));
        id
    }

    pub fn unregister(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    /// Hand `error` to every observer
    pub fn notify(&self, error: &CapturedError) {
        // snapshot so an observer can register or unregister without deadlocking
        let observers: Vec<ErrorObserver> = self
            .observers
            .read()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in observers {
            observer(error);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.read().is_empty()
    }
}

impl ErrorLogger {
    /// Register this logger as an observer of `registry`
    pub fn observe(&self, registry: &ErrorObserverRegistry) -> ObserverId {
        let logger = self.clone();
        registry.register(move |error| {
            logger.write(error.clone());
        })
    }

    /// Build a logger from `config` and attach it to the process panic hook.
    ///
    /// Without an endpoint this does nothing and returns `None`: no hook is
    /// installed and nothing is ever queued.
    pub fn install(config: &crate::config::LoggerConfig) -> ErrorLoggerResult<Option<Self>> {
        let Some(logger) = ErrorLogger::from_config(config)? else {
            return Ok(None);
        };

        install_panic_hook()?;
        logger.observe(ErrorObserverRegistry::global());
        info!(endpoint = ?config.endpoint(), "Error logger attached to panic hook");
        Ok(Some(logger))
    }
}

/// Route panics to the global registry, chaining to the previously installed hook.
///
/// Installing more than once is a no-op.
pub fn install_panic_hook() -> ErrorLoggerResult<()> {
    if std::thread::panicking() {
        return Err(ErrorLoggerError::hook(
            "cannot replace the panic hook from a panicking thread",
        ));
    }

    if PANIC_HOOK_INSTALLED.swap(true, Ordering::SeqCst) {
        debug!("Panic hook already installed");
        return Ok(());
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        previous(info);

        // a panic inside our own delivery attempt must not be queued as a new error
        if crate::delivery::in_delivery() {
            return;
        }

        let captured = captured_from_panic(info.payload(), info.location());
        GLOBAL_REGISTRY.notify(&captured);
    }));

    Ok(())
}

/// Build a captured error from the parts of a panic
pub fn captured_from_panic(
    payload: &(dyn Any + Send),
    location: Option<&Location<'_>>,
) -> CapturedError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "Box<dyn Any>".to_string());

    let mut captured = CapturedError::new(message);
    if let Some(location) = location {
        captured.source = Some(location.file().to_string());
        captured.line = Some(location.line());
        captured.column = Some(location.column());
    }
    if let Some(name) = std::thread::current().name() {
        captured.extra.insert("thread".to_string(), name.to_string());
    }
    captured
}
