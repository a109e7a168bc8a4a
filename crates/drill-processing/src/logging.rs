//! Pipeline event logging.
//!
//! The processor reports step-level progress and failures through an injected
//! [`ProcessingLogger`] instead of a global logger, so callers and tests can
//! observe the event stream. Logging is side-effect only: it never returns an
//! error and never affects control flow.
//!
//! # Example
//!
//! ```rust,ignore
//! use drill_processing::{DrillingProcessor, MemoryLogger};
//! use std::sync::Arc;
//!
//! let logger = Arc::new(MemoryLogger::new());
//! let mut processor = DrillingProcessor::builder()
//!     .logger(logger.clone())
//!     .build()?;
//!
//! processor.load("well_17.parquet")?;
//! processor.run()?;
//!
//! for event in logger.events() {
//!     println!("[{}] {}", event.level, event.message);
//! }
//! ```

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, info, warn};

/// Severity of a pipeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recorded pipeline event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub level: LogLevel,
    pub message: String,
}

/// Receiver of pipeline events.
///
/// Implementations must be `Send + Sync` because the logger is shared through
/// an `Arc` between the processor and the caller.
pub trait ProcessingLogger: Send + Sync {
    /// Record one event. Must not panic.
    fn log(&self, message: &str, level: LogLevel);
}

/// Forwards events to the `tracing` macros. This is the default logger.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl ProcessingLogger for TracingLogger {
    fn log(&self, message: &str, level: LogLevel) {
        match level {
            LogLevel::Debug => debug!("{}", message),
            LogLevel::Info => info!("{}", message),
            LogLevel::Warning => warn!("{}", message),
            LogLevel::Error => error!("{}", message),
        }
    }
}

/// Append-only in-memory event log.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    events: Mutex<Vec<LogEvent>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events recorded so far, in order.
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().clone()
    }

    /// Events at exactly `level`.
    pub fn events_at(&self, level: LogLevel) -> Vec<LogEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.level == level)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl ProcessingLogger for MemoryLogger {
    fn log(&self, message: &str, level: LogLevel) {
        self.events.lock().push(LogEvent {
            level,
            message: message.to_string(),
        });
    }
}

/// Wrapper that implements [`ProcessingLogger`] using a closure.
///
/// # Example
///
/// ```rust,ignore
/// DrillingProcessor::builder()
///     .on_log(|message, level| eprintln!("{level}: {message}"))
///     .build()?;
/// ```
pub struct ClosureLogger<F>
where
    F: Fn(&str, LogLevel) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureLogger<F>
where
    F: Fn(&str, LogLevel) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProcessingLogger for ClosureLogger<F>
where
    F: Fn(&str, LogLevel) + Send + Sync,
{
    fn log(&self, message: &str, level: LogLevel) {
        (self.callback)(message, level);
    }
}

static_assertions::assert_impl_all!(MemoryLogger: Send, Sync);
static_assertions::assert_impl_all!(TracingLogger: Send, Sync);
