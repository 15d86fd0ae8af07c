//! Landmark replay from JSON-lines recordings

use camera_capture::VideoFrame;
use dms::{DetectorError, LandmarkProvider, LandmarkSample, Point3};
use serde::Deserialize;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

use crate::MonitorError;

/// One recorded detection.
///
/// `{"landmarks": [[x, y, z], ...]}` is a face, `{"landmarks": null}` is no
/// face, and `{"error": "..."}` replays a transient detector failure.
#[derive(Debug, Clone, Deserialize)]
struct ReplayRecord {
    #[serde(default)]
    landmarks: Option<Vec<[f32; 3]>>,
    #[serde(default)]
    error: Option<String>,
}

/// Landmark provider answering each detection with the next recorded line
pub struct ReplayProvider {
    records: VecDeque<ReplayRecord>,
    total: usize,
}

impl ReplayProvider {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MonitorError> {
        let path = path.as_ref();
        let provider = Self::from_reader(BufReader::new(File::open(path)?))?;
        info!("Loaded {} replay records from {}", provider.total, path.display());
        Ok(provider)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, MonitorError> {
        let mut records = VecDeque::new();
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let record: ReplayRecord = serde_json::from_str(line)
                .map_err(|e| MonitorError::Replay(format!("line {}: {}", n + 1, e)))?;
            records.push_back(record);
        }
        let total = records.len();
        Ok(Self { records, total })
    }

    pub fn remaining(&self) -> usize {
        self.records.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.records.is_empty()
    }
}

impl LandmarkProvider for ReplayProvider {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<LandmarkSample>, DetectorError> {
        let Some(record) = self.records.pop_front() else {
            debug!("Replay exhausted at frame {}", frame.sequence);
            return Ok(None);
        };

        if let Some(error) = record.error {
            return Err(DetectorError::Transient(error));
        }

        Ok(record
            .landmarks
            .map(|points| points.into_iter().map(Point3::from).collect()))
    }
}
