//! Driver Monitoring System (DMS)
//!
//! Eye-closure drowsiness classification from facial landmark samples:
//! - Eye contour extraction from face-mesh landmarks
//! - Eye aspect ratio (EAR) per eye and averaged per sample
//! - Hysteresis classification into ALERT / DROWSY / CRITICAL / NO_FACE
//! - Sample scheduling with throttling, readiness and detector backoff
//! - Status publication to sinks

pub mod config;
pub mod ear;
pub mod landmarks;
pub mod scheduler;
pub mod sink;
pub mod state;

pub use config::DmsConfig;
pub use ear::{average_ear, eye_aspect_ratio, sample_ear};
pub use landmarks::{extract_eye, Eye, EyeContour, LandmarkSample, Point3};
pub use scheduler::{DetectorError, LandmarkProvider, SampleScheduler, TickOutcome};
pub use sink::{ChannelSink, LogSink, StatusEvent, StatusSink, WatchSink};
pub use state::{ClassifierSnapshot, DriverStatus, HysteresisClassifier};

use camera_capture::{CameraError, FrameSource, SourceGuard};
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info};

/// DMS error types
#[derive(Error, Debug)]
pub enum DmsError {
    #[error("Capture source acquisition failed: {0}")]
    SourceAcquisition(#[from] CameraError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A monitoring session: exclusive capture source plus classification chain.
///
/// The source is released when the session is stopped or dropped.
pub struct MonitoringSession<S: FrameSource, P: LandmarkProvider> {
    scheduler: SampleScheduler<SourceGuard<S>, P>,
}

impl<S: FrameSource, P: LandmarkProvider> MonitoringSession<S, P> {
    /// Validate configuration, acquire the capture source and start monitoring.
    ///
    /// Acquisition failure is reported once here; no session is created.
    pub fn start<F>(config: &DmsConfig, open: F, provider: P) -> Result<Self, DmsError>
    where
        F: FnOnce() -> Result<S, CameraError>,
    {
        config.validate()?;

        let source = SourceGuard::acquire("cabin", open).map_err(|e| {
            error!("Monitoring not started: {}", e);
            DmsError::SourceAcquisition(e)
        })?;

        info!(
            drowsy = config.drowsy_threshold,
            critical = config.critical_threshold,
            confirm_ms = config.confirm_window_ms,
            "Monitoring session started"
        );

        Ok(Self {
            scheduler: SampleScheduler::new(config, source, provider),
        })
    }

    pub fn add_sink<K: StatusSink + Send + 'static>(&mut self, sink: K) {
        self.scheduler.add_sink(sink);
    }

    pub fn tick(&mut self, now: Instant) -> Option<StatusEvent> {
        self.scheduler.tick(now)
    }

    pub fn poll(&mut self, now: Instant) -> TickOutcome {
        self.scheduler.poll(now)
    }

    pub fn current_status(&self) -> DriverStatus {
        self.scheduler.current_status()
    }

    pub fn snapshot(&self) -> ClassifierSnapshot {
        self.scheduler.snapshot()
    }

    /// Reset driver state (on driver change)
    pub fn reset_driver(&mut self) {
        info!("Driver state reset");
        self.scheduler.reset_classifier();
    }

    pub fn source_mut(&mut self) -> Option<&mut S> {
        self.scheduler.source_mut().get_mut()
    }

    pub fn provider_mut(&mut self) -> &mut P {
        self.scheduler.provider_mut()
    }

    /// Stop monitoring and release the capture source
    pub fn stop(self) -> ClassifierSnapshot {
        let snapshot = self.scheduler.snapshot();
        let (source, _provider) = self.scheduler.into_parts();
        source.release();
        info!(status = %snapshot.status, "Monitoring session stopped");
        snapshot
    }
}
