//! Event log backends

use chrono::{DateTime, Utc};
use dms::{DriverStatus, StatusEvent};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::AlertError;

/// Record accepted by the event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrowsinessEvent {
    pub status: DriverStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ear: Option<f32>,
}

impl From<&StatusEvent> for DrowsinessEvent {
    fn from(event: &StatusEvent) -> Self {
        Self {
            status: event.status,
            timestamp: event.timestamp,
            ear: Some(event.ear),
        }
    }
}

/// Destination for drowsiness events.
///
/// Runs on the forwarder's background task, never on the classification path.
pub trait EventLog: Send + 'static {
    fn record(&mut self, event: &DrowsinessEvent) -> Result<(), AlertError>;
}

impl EventLog for Box<dyn EventLog> {
    fn record(&mut self, event: &DrowsinessEvent) -> Result<(), AlertError> {
        (**self).record(event)
    }
}

/// Appends one JSON object per line
pub struct JsonLinesEventLog<W: Write + Send + 'static> {
    writer: W,
}

impl JsonLinesEventLog<BufWriter<File>> {
    /// Open (or create) `path` for appending
    pub fn create(path: impl AsRef<Path>) -> Result<Self, AlertError> {
        let path = path.as_ref();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        info!("Appending drowsiness events to {}", path.display());
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Send + 'static> JsonLinesEventLog<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send + 'static> EventLog for JsonLinesEventLog<W> {
    fn record(&mut self, event: &DrowsinessEvent) -> Result<(), AlertError> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Logs events through `tracing` only
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventLog;

impl EventLog for TracingEventLog {
    fn record(&mut self, event: &DrowsinessEvent) -> Result<(), AlertError> {
        warn!(
            status = %event.status,
            timestamp = %event.timestamp.to_rfc3339(),
            "Driver status change: {}",
            event.status.message()
        );
        Ok(())
    }
}

/// Shared in-memory log; clones see the same events
#[derive(Debug, Default, Clone)]
pub struct MemoryEventLog {
    events: Arc<Mutex<Vec<DrowsinessEvent>>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DrowsinessEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventLog for MemoryEventLog {
    fn record(&mut self, event: &DrowsinessEvent) -> Result<(), AlertError> {
        let mut events = self
            .events
            .lock()
            .map_err(|e| AlertError::Unavailable(format!("Lock error: {}", e)))?;
        events.push(event.clone());
        Ok(())
    }
}
