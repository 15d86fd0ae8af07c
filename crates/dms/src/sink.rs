//! Status publication

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::state::DriverStatus;

/// Outcome of one completed tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEvent {
    pub status: DriverStatus,
    /// Averaged EAR, `0.0` when no face was found
    pub ear: f32,
    /// Monotonic instant of the tick
    #[serde(skip)]
    pub at: Instant,
    /// Wall-clock time of the tick
    pub timestamp: DateTime<Utc>,
}

impl StatusEvent {
    pub fn new(status: DriverStatus, ear: Option<f32>, at: Instant) -> Self {
        Self {
            status,
            ear: ear.unwrap_or(0.0),
            at,
            timestamp: Utc::now(),
        }
    }
}

/// Consumer of classifier output.
///
/// Called once per completed update. Implementations must not block; the
/// classifier proceeds regardless of what a sink does with the event.
pub trait StatusSink {
    fn publish(&mut self, event: &StatusEvent);
}

impl<F> StatusSink for F
where
    F: FnMut(&StatusEvent),
{
    fn publish(&mut self, event: &StatusEvent) {
        self(event)
    }
}

/// Latest-value sink; observers read snapshots from a `watch` receiver
pub struct WatchSink {
    tx: watch::Sender<Option<StatusEvent>>,
}

impl WatchSink {
    pub fn new() -> (Self, watch::Receiver<Option<StatusEvent>>) {
        let (tx, rx) = watch::channel(None);
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<StatusEvent>> {
        self.tx.subscribe()
    }
}

impl StatusSink for WatchSink {
    fn publish(&mut self, event: &StatusEvent) {
        self.tx.send_replace(Some(event.clone()));
    }
}

/// Bounded queue sink; events are dropped when the queue is full
pub struct ChannelSink {
    tx: mpsc::Sender<StatusEvent>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<StatusEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl StatusSink for ChannelSink {
    fn publish(&mut self, event: &StatusEvent) {
        match self.tx.try_send(event.clone()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Status queue full, dropping {} event", event.status);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Status queue closed, dropping {} event", event.status);
            }
        }
    }
}

/// Writes every event to the log
#[derive(Debug, Default)]
pub struct LogSink {
    last: Option<DriverStatus>,
}

impl StatusSink for LogSink {
    fn publish(&mut self, event: &StatusEvent) {
        if self.last != Some(event.status) {
            info!(status = %event.status, ear = event.ear, "{}", event.status.message());
            self.last = Some(event.status);
        } else {
            debug!(status = %event.status, ear = event.ear, "tick");
        }
    }
}
