//! Severe-status forwarding

use dms::{DriverStatus, StatusEvent, StatusSink};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::event_log::{DrowsinessEvent, EventLog};

/// Forwarder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwarderConfig {
    /// Events buffered for the event log before new ones are dropped
    pub queue_capacity: usize,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self { queue_capacity: 64 }
    }
}

/// Counters kept by the forwarder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwarderStats {
    /// Events handed to the delivery task
    pub forwarded: u64,
    /// Events dropped because the queue was full or closed
    pub dropped: u64,
}

/// Status sink forwarding transitions into DROWSY or CRITICAL to an event log.
///
/// Delivery happens on a background task; `publish` only enqueues. Repeated
/// ticks in the same severe status are not re-sent.
pub struct EventForwarder {
    tx: mpsc::Sender<DrowsinessEvent>,
    last_status: Option<DriverStatus>,
    stats: ForwarderStats,
}

impl EventForwarder {
    /// Spawn the delivery task on the current tokio runtime.
    ///
    /// The task ends once the forwarder is dropped and the queue drained,
    /// handing the log back through the join handle.
    pub fn spawn<L: EventLog>(config: &ForwarderConfig, mut log: L) -> (Self, JoinHandle<L>) {
        let (tx, mut rx) = mpsc::channel::<DrowsinessEvent>(config.queue_capacity.max(1));

        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match log.record(&event) {
                    Ok(()) => debug!("Recorded {} event", event.status),
                    Err(e) => error!("Failed to record {} event: {}", event.status, e),
                }
            }
            debug!("Event forwarder queue closed");
            log
        });

        info!("Event forwarder started (queue capacity {})", config.queue_capacity);

        (
            Self {
                tx,
                last_status: None,
                stats: ForwarderStats::default(),
            },
            handle,
        )
    }

    pub fn stats(&self) -> ForwarderStats {
        self.stats
    }
}

impl StatusSink for EventForwarder {
    fn publish(&mut self, event: &StatusEvent) {
        let changed = self.last_status != Some(event.status);
        self.last_status = Some(event.status);

        if !changed || !event.status.is_severe() {
            return;
        }

        match self.tx.try_send(DrowsinessEvent::from(event)) {
            Ok(()) => self.stats.forwarded += 1,
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                self.stats.dropped += 1;
                warn!("Event log queue full, dropping {} event", dropped.status);
            }
            Err(mpsc::error::TrySendError::Closed(dropped)) => {
                self.stats.dropped += 1;
                warn!("Event log task gone, dropping {} event", dropped.status);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AlertError, MemoryEventLog};
    use std::time::Instant;

    fn event(status: DriverStatus) -> StatusEvent {
        StatusEvent::new(status, Some(0.2), Instant::now())
    }

    #[tokio::test]
    async fn test_forwards_only_severe_transitions() {
        let log = MemoryEventLog::new();
        let (mut forwarder, handle) = EventForwarder::spawn(&ForwarderConfig::default(), log.clone());

        for status in [
            DriverStatus::NoFace,
            DriverStatus::Alert,
            DriverStatus::Drowsy,
            DriverStatus::Drowsy,
            DriverStatus::Critical,
            DriverStatus::Critical,
            DriverStatus::Alert,
            DriverStatus::Critical,
        ] {
            forwarder.publish(&event(status));
        }
        assert_eq!(forwarder.stats().forwarded, 3);

        drop(forwarder);
        handle.await.unwrap();

        let statuses: Vec<_> = log.events().iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![DriverStatus::Drowsy, DriverStatus::Critical, DriverStatus::Critical]
        );
    }

    struct FailingLog {
        attempts: u32,
    }

    impl EventLog for FailingLog {
        fn record(&mut self, _event: &DrowsinessEvent) -> Result<(), AlertError> {
            self.attempts += 1;
            Err(AlertError::Unavailable("database down".into()))
        }
    }

    #[tokio::test]
    async fn test_delivery_failures_are_absorbed() {
        let (mut forwarder, handle) =
            EventForwarder::spawn(&ForwarderConfig::default(), FailingLog { attempts: 0 });

        forwarder.publish(&event(DriverStatus::Drowsy));
        forwarder.publish(&event(DriverStatus::Critical));
        drop(forwarder);

        let log = handle.await.unwrap();
        assert_eq!(log.attempts, 2);
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let config = ForwarderConfig { queue_capacity: 1 };
        let (mut forwarder, handle) = EventForwarder::spawn(&config, MemoryEventLog::new());

        // No await point between publishes, so the delivery task cannot drain
        forwarder.publish(&event(DriverStatus::Drowsy));
        forwarder.publish(&event(DriverStatus::Critical));
        forwarder.publish(&event(DriverStatus::Drowsy));

        assert_eq!(forwarder.stats(), ForwarderStats { forwarded: 1, dropped: 2 });
        drop(forwarder);
        assert_eq!(handle.await.unwrap().events().len(), 1);
    }
}
