//! Driver status and the hysteresis classifier

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::ear::sample_ear;
use crate::landmarks::LandmarkSample;
use crate::DmsConfig;

/// Driver status, the classifier's only observable output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverStatus {
    Alert,
    Drowsy,
    Critical,
    #[default]
    NoFace,
}

impl DriverStatus {
    /// Statuses that are reported to the event log
    pub fn is_severe(self) -> bool {
        matches!(self, DriverStatus::Drowsy | DriverStatus::Critical)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DriverStatus::Alert => "ALERT",
            DriverStatus::Drowsy => "DROWSY",
            DriverStatus::Critical => "CRITICAL",
            DriverStatus::NoFace => "NO_FACE",
        }
    }

    /// Operator-facing message for this status
    pub fn message(self) -> &'static str {
        match self {
            DriverStatus::Alert => "Driver is alert.",
            DriverStatus::Drowsy => "Drowsiness detected. Stay focused.",
            DriverStatus::Critical => "Critical fatigue. Pull over now.",
            DriverStatus::NoFace => "Face not detected. Adjust camera.",
        }
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one classifier update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub status: DriverStatus,
    /// Averaged EAR, `None` when no face was available
    pub ear: Option<f32>,
}

/// Read-only view of the classifier's private state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierSnapshot {
    pub status: DriverStatus,
    /// Start of the current sub-threshold run
    pub run_started: Option<Instant>,
    pub last_sample: Option<Instant>,
}

/// Converts per-sample EAR observations into a debounced driver status.
///
/// A run of samples below the drowsy threshold must last the confirmation
/// window before it is announced; any sample at or above the threshold
/// cancels the run.
#[derive(Debug, Clone)]
pub struct HysteresisClassifier {
    drowsy_threshold: f32,
    critical_threshold: f32,
    confirm_window: Duration,
    status: DriverStatus,
    run_started: Option<Instant>,
    last_sample: Option<Instant>,
}

impl HysteresisClassifier {
    pub fn new(config: &DmsConfig) -> Self {
        Self {
            drowsy_threshold: config.drowsy_threshold,
            critical_threshold: config.critical_threshold,
            confirm_window: config.confirm_window(),
            status: DriverStatus::NoFace,
            run_started: None,
            last_sample: None,
        }
    }

    /// Process one accepted sample; `None` means no face was detected
    pub fn update(&mut self, sample: Option<&LandmarkSample>, now: Instant) -> Classification {
        let ear = sample_ear(sample);
        let status = self.update_with_ear(ear, now);
        Classification { status, ear }
    }

    /// Process an already-computed averaged EAR; `None` means no face
    pub fn update_with_ear(&mut self, ear: Option<f32>, now: Instant) -> DriverStatus {
        self.last_sample = Some(now);
        let previous = self.status;

        self.status = match ear {
            None => {
                self.run_started = None;
                DriverStatus::NoFace
            }
            Some(ear) if ear >= self.drowsy_threshold => {
                self.run_started = None;
                DriverStatus::Alert
            }
            Some(ear) => self.classify_run(ear, now),
        };

        if self.status != previous {
            if self.status.is_severe() {
                info!(from = %previous, to = %self.status, ?ear, "Driver status changed");
            } else {
                debug!(from = %previous, to = %self.status, ?ear, "Driver status changed");
            }
        }

        self.status
    }

    fn classify_run(&mut self, ear: f32, now: Instant) -> DriverStatus {
        let mut status = self.status;
        let started = match self.run_started {
            Some(started) => started,
            None => {
                debug!(ear, "Sub-threshold run started");
                self.run_started = Some(now);
                if status == DriverStatus::NoFace {
                    status = DriverStatus::Alert;
                }
                now
            }
        };

        if now.saturating_duration_since(started) < self.confirm_window {
            return status;
        }

        if ear < self.critical_threshold {
            DriverStatus::Critical
        } else {
            DriverStatus::Drowsy
        }
    }

    pub fn current_status(&self) -> DriverStatus {
        self.status
    }

    pub fn snapshot(&self) -> ClassifierSnapshot {
        ClassifierSnapshot {
            status: self.status,
            run_started: self.run_started,
            last_sample: self.last_sample,
        }
    }

    /// Reset to the initial state (on driver change)
    pub fn reset(&mut self) {
        self.status = DriverStatus::NoFace;
        self.run_started = None;
        self.last_sample = None;
    }
}
