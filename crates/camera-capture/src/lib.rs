//! Camera Capture Library for Driver Monitoring
//!
//! Provides the capture-source side of the monitoring pipeline:
//! - Frame type handed to landmark detectors
//! - Source readiness reporting (decodable, sized, playing, started)
//! - Scoped ownership of an acquired source
//! - A synthetic source for replay and tests

pub mod frame;
pub mod source;
pub mod synthetic;

pub use frame::VideoFrame;
pub use source::{FrameSource, Readiness, SourceGuard};
pub use synthetic::SyntheticSource;

use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open camera: {0}")]
    Open(String),

    #[error("Camera access denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Camera not initialized")]
    NotInitialized,
}

/// Camera configuration
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Device path (e.g., "/dev/video0")
    pub device: String,
    /// Capture width
    pub width: u32,
    /// Capture height
    pub height: u32,
    /// Target FPS
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self::cabin()
    }
}

impl CameraConfig {
    /// Cabin-facing camera, user-facing 640x480
    pub fn cabin() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            width: 640,
            height: 480,
            fps: 30,
        }
    }

    /// Check the requested geometry before a source is opened
    pub fn validate(&self) -> Result<(), CameraError> {
        if self.width == 0 || self.height == 0 {
            return Err(CameraError::Format(format!(
                "zero-sized capture {}x{}",
                self.width, self.height
            )));
        }
        if self.fps == 0 {
            return Err(CameraError::Format("fps must be positive".into()));
        }
        Ok(())
    }
}
