//! DMS configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::DmsError;

/// DMS configuration, fixed for the lifetime of a monitoring session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Averaged EAR below this starts a drowsiness run
    pub drowsy_threshold: f32,

    /// Averaged EAR below this is classified critical once confirmed
    pub critical_threshold: f32,

    /// Continuous sub-threshold time before a run is announced (milliseconds)
    pub confirm_window_ms: u64,

    /// Minimum time between accepted samples (milliseconds)
    pub min_sample_interval_ms: u64,

    /// Pause after a detector failure before sampling again (milliseconds)
    pub transient_failure_backoff_ms: u64,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            drowsy_threshold: 0.25,
            critical_threshold: 0.20,
            confirm_window_ms: 2000,
            min_sample_interval_ms: 200,
            transient_failure_backoff_ms: 1000,
        }
    }
}

impl DmsConfig {
    /// Create strict config (shorter confirmation)
    pub fn strict() -> Self {
        Self {
            confirm_window_ms: 1500,
            ..Default::default()
        }
    }

    /// Create lenient config (longer confirmation)
    pub fn lenient() -> Self {
        Self {
            confirm_window_ms: 3000,
            ..Default::default()
        }
    }

    pub fn confirm_window(&self) -> Duration {
        Duration::from_millis(self.confirm_window_ms)
    }

    pub fn min_sample_interval(&self) -> Duration {
        Duration::from_millis(self.min_sample_interval_ms)
    }

    pub fn transient_failure_backoff(&self) -> Duration {
        Duration::from_millis(self.transient_failure_backoff_ms)
    }

    /// Reject configurations the classifier cannot run with
    pub fn validate(&self) -> Result<(), DmsError> {
        for (name, value) in [
            ("drowsy_threshold", self.drowsy_threshold),
            ("critical_threshold", self.critical_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(DmsError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if self.critical_threshold > self.drowsy_threshold {
            return Err(DmsError::Config(format!(
                "critical_threshold ({}) must not exceed drowsy_threshold ({})",
                self.critical_threshold, self.drowsy_threshold
            )));
        }

        if self.confirm_window_ms == 0 {
            return Err(DmsError::Config("confirm_window_ms must be positive".into()));
        }

        if self.min_sample_interval_ms == 0 {
            return Err(DmsError::Config(
                "min_sample_interval_ms must be positive".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DmsConfig::default();
        assert_eq!(config.drowsy_threshold, 0.25);
        assert_eq!(config.critical_threshold, 0.20);
        assert_eq!(config.confirm_window(), Duration::from_millis(2000));
        assert_eq!(config.min_sample_interval(), Duration::from_millis(200));
        assert_eq!(config.transient_failure_backoff(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(DmsConfig::strict().validate().is_ok());
        assert!(DmsConfig::lenient().validate().is_ok());
        assert!(DmsConfig::strict().confirm_window() < DmsConfig::lenient().confirm_window());
    }

    #[test]
    fn test_critical_above_drowsy_rejected() {
        let config = DmsConfig {
            critical_threshold: 0.3,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DmsError::Config(_))));
    }

    #[test]
    fn test_equal_thresholds_allowed() {
        let config = DmsConfig {
            critical_threshold: 0.25,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_non_finite_threshold_rejected() {
        let config = DmsConfig {
            drowsy_threshold: f32::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_window_rejected() {
        let config = DmsConfig {
            confirm_window_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
