//! Video frame types

use std::time::Duration;

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Media position of this frame since the source started playing
    pub position: Duration,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, position: Duration, sequence: u32) -> Self {
        Self {
            data,
            width,
            height,
            position,
            sequence,
        }
    }

    /// Create a black frame of the given size
    pub fn blank(width: u32, height: u32, position: Duration, sequence: u32) -> Self {
        let len = (width as usize) * (height as usize) * 3;
        Self::new(vec![0; len], width, height, position, sequence)
    }

    /// Whether the frame has a non-zero spatial extent
    pub fn has_extent(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}
