//! Synthetic frame source for replay and tests

use std::time::{Duration, Instant};

use crate::source::{FrameSource, Readiness};
use crate::{CameraConfig, CameraError, VideoFrame};

#[derive(Debug, Clone, Copy)]
enum Clock {
    /// Position follows wall time since the source was opened
    Wall(Instant),
    /// Position is driven by the caller
    Manual(Duration),
}

/// Frame source producing blank frames with controllable liveness
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    width: u32,
    height: u32,
    decodable: bool,
    paused: bool,
    clock: Clock,
    sequence: u32,
    released: bool,
}

impl SyntheticSource {
    /// Open a source that starts playing immediately
    pub fn open(config: &CameraConfig) -> Result<Self, CameraError> {
        config.validate()?;
        Ok(Self {
            width: config.width,
            height: config.height,
            decodable: true,
            paused: false,
            clock: Clock::Wall(Instant::now()),
            sequence: 0,
            released: false,
        })
    }

    /// A source whose position only moves through [`advance`](Self::advance)
    pub fn manual(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            decodable: true,
            paused: false,
            clock: Clock::Manual(Duration::ZERO),
            sequence: 0,
            released: false,
        }
    }

    pub fn advance(&mut self, by: Duration) {
        if let Clock::Manual(position) = &mut self.clock {
            *position += by;
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn set_decodable(&mut self, decodable: bool) {
        self.decodable = decodable;
    }

    pub fn set_extent(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    fn position(&self) -> Duration {
        match self.clock {
            Clock::Wall(started) => started.elapsed(),
            Clock::Manual(position) => position,
        }
    }
}

impl FrameSource for SyntheticSource {
    fn readiness(&self) -> Readiness {
        if self.released || !self.decodable {
            Readiness::NotDecodable
        } else if self.width == 0 || self.height == 0 {
            Readiness::ZeroExtent
        } else if self.paused {
            Readiness::Paused
        } else if self.position().is_zero() {
            Readiness::NotStarted
        } else {
            Readiness::Ready
        }
    }

    fn current_frame(&mut self) -> Option<VideoFrame> {
        if !self.readiness().is_ready() {
            return None;
        }
        self.sequence = self.sequence.wrapping_add(1);
        Some(VideoFrame::blank(
            self.width,
            self.height,
            self.position(),
            self.sequence,
        ))
    }

    fn release(&mut self) {
        self.released = true;
    }
}
