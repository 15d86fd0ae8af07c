//! Alerting System
//!
//! Forwards severe driver statuses (DROWSY, CRITICAL) to an event log
//! without ever blocking the classification loop.

mod event_log;
mod forwarder;

pub use event_log::{DrowsinessEvent, EventLog, JsonLinesEventLog, MemoryEventLog, TracingEventLog};
pub use forwarder::{EventForwarder, ForwarderConfig, ForwarderStats};

use thiserror::Error;

/// Alerting error types
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Event log I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Event log unavailable: {0}")]
    Unavailable(String),
}
