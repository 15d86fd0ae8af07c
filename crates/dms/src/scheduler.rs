//! Sample scheduling: throttling, readiness and detector backoff

use camera_capture::{FrameSource, Readiness, VideoFrame};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::landmarks::LandmarkSample;
use crate::sink::{StatusEvent, StatusSink};
use crate::state::{ClassifierSnapshot, DriverStatus, HysteresisClassifier};
use crate::DmsConfig;

/// Landmark detector failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectorError {
    /// The detector failed mid-detection; the next attempt may succeed
    #[error("Transient detector failure: {0}")]
    Transient(String),
}

/// Facial landmark detection capability.
///
/// `Ok(None)` means the frame contained no face.
pub trait LandmarkProvider {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<LandmarkSample>, DetectorError>;
}

impl<F> LandmarkProvider for F
where
    F: FnMut(&VideoFrame) -> Result<Option<LandmarkSample>, DetectorError>,
{
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<LandmarkSample>, DetectorError> {
        self(frame)
    }
}

/// What happened on a scheduling opportunity
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Too soon after the last accepted tick
    Throttled,
    /// Waiting out the backoff after a detector failure
    BackingOff,
    /// The capture source cannot produce a frame yet
    SourceNotReady(Readiness),
    /// The detector failed; backoff armed
    DetectorFailed,
    /// The classifier ran and sinks were notified
    Classified(StatusEvent),
}

impl TickOutcome {
    pub fn into_event(self) -> Option<StatusEvent> {
        match self {
            TickOutcome::Classified(event) => Some(event),
            _ => None,
        }
    }
}

/// Decides, per scheduling opportunity, whether the classifier runs.
///
/// Runs the source → detector → classifier → sinks chain to completion on
/// the caller's thread. Never decides status itself.
pub struct SampleScheduler<S, P> {
    source: S,
    provider: P,
    classifier: HysteresisClassifier,
    sinks: Vec<Box<dyn StatusSink + Send>>,
    min_interval: Duration,
    backoff: Duration,
    last_accepted: Option<Instant>,
    resume_at: Option<Instant>,
}

impl<S: FrameSource, P: LandmarkProvider> SampleScheduler<S, P> {
    pub fn new(config: &DmsConfig, source: S, provider: P) -> Self {
        Self {
            source,
            provider,
            classifier: HysteresisClassifier::new(config),
            sinks: Vec::new(),
            min_interval: config.min_sample_interval(),
            backoff: config.transient_failure_backoff(),
            last_accepted: None,
            resume_at: None,
        }
    }

    /// Attach a sink; sinks are notified in attachment order
    pub fn add_sink<K: StatusSink + Send + 'static>(&mut self, sink: K) {
        self.sinks.push(Box::new(sink));
    }

    /// Run one scheduling opportunity, returning the published event if any
    pub fn tick(&mut self, now: Instant) -> Option<StatusEvent> {
        self.poll(now).into_event()
    }

    /// Run one scheduling opportunity and report why it did or did not classify
    pub fn poll(&mut self, now: Instant) -> TickOutcome {
        if let Some(resume_at) = self.resume_at {
            if now < resume_at {
                trace!("Tick dropped: detector backoff");
                return TickOutcome::BackingOff;
            }
            self.resume_at = None;
        }

        let readiness = self.source.readiness();
        if !readiness.is_ready() {
            trace!(%readiness, "Tick dropped: source not ready");
            return TickOutcome::SourceNotReady(readiness);
        }

        if let Some(last) = self.last_accepted {
            if now.saturating_duration_since(last) < self.min_interval {
                return TickOutcome::Throttled;
            }
        }

        let frame = match self.source.current_frame() {
            Some(frame) => frame,
            None => {
                trace!("Tick dropped: source returned no frame");
                return TickOutcome::SourceNotReady(Readiness::NotDecodable);
            }
        };
        if !frame.has_extent() {
            trace!(frame = frame.sequence, "Tick dropped: frame has no extent");
            return TickOutcome::SourceNotReady(Readiness::ZeroExtent);
        }
        self.last_accepted = Some(now);

        let sample = match self.provider.detect(&frame) {
            Ok(sample) => sample,
            Err(e) => {
                warn!(
                    "Landmark detection failed on frame {}: {}; backing off {:?}",
                    frame.sequence, e, self.backoff
                );
                self.resume_at = Some(now + self.backoff);
                return TickOutcome::DetectorFailed;
            }
        };

        let classification = self.classifier.update(sample.as_ref(), now);
        let event = StatusEvent::new(classification.status, classification.ear, now);
        debug!(status = %event.status, ear = event.ear, frame = frame.sequence, "Tick classified");

        for sink in &mut self.sinks {
            sink.publish(&event);
        }

        TickOutcome::Classified(event)
    }

    pub fn current_status(&self) -> DriverStatus {
        self.classifier.current_status()
    }

    pub fn snapshot(&self) -> ClassifierSnapshot {
        self.classifier.snapshot()
    }

    /// Reset classification (on driver change); throttling state is kept
    pub fn reset_classifier(&mut self) {
        self.classifier.reset();
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// Give back the source and provider
    pub fn into_parts(self) -> (S, P) {
        (self.source, self.provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::testing::sample_with_ear;
    use camera_capture::SyntheticSource;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    const TICK: Duration = Duration::from_millis(200);

    /// Provider replaying a fixed script of detection results
    struct Scripted {
        script: VecDeque<Result<Option<f32>, DetectorError>>,
        calls: usize,
    }

    impl Scripted {
        fn new(script: Vec<Result<Option<f32>, DetectorError>>) -> Self {
            Self {
                script: script.into(),
                calls: 0,
            }
        }
    }

    impl LandmarkProvider for Scripted {
        fn detect(&mut self, _frame: &VideoFrame) -> Result<Option<LandmarkSample>, DetectorError> {
            self.calls += 1;
            match self.script.pop_front() {
                Some(result) => result.map(|ear| ear.map(sample_with_ear)),
                None => Ok(None),
            }
        }
    }

    fn ready_source() -> SyntheticSource {
        let mut source = SyntheticSource::manual(640, 480);
        source.advance(Duration::from_millis(33));
        source
    }

    fn scheduler(
        script: Vec<Result<Option<f32>, DetectorError>>,
    ) -> SampleScheduler<SyntheticSource, Scripted> {
        SampleScheduler::new(&DmsConfig::default(), ready_source(), Scripted::new(script))
    }

    fn transient() -> Result<Option<f32>, DetectorError> {
        Err(DetectorError::Transient("gpu lost".into()))
    }

    #[test]
    fn test_min_interval_gate() {
        let mut s = scheduler(vec![Ok(Some(0.3)); 4]);
        let t0 = Instant::now();

        assert!(s.tick(t0).is_some());
        assert_eq!(s.poll(t0 + Duration::from_millis(16)), TickOutcome::Throttled);
        assert_eq!(s.poll(t0 + Duration::from_millis(199)), TickOutcome::Throttled);
        assert!(s.tick(t0 + TICK).is_some());
        assert_eq!(s.provider_mut().calls, 2);
    }

    #[test]
    fn test_frame_rate_loop_caps_at_five_hz() {
        let mut s = scheduler(vec![Ok(Some(0.3)); 100]);
        let t0 = Instant::now();
        let accepted = (0..60)
            .filter(|i| s.tick(t0 + Duration::from_millis(i * 33)).is_some())
            .count();
        // 60 frames at ~30fps span ~2s
        assert!(accepted <= 11, "accepted {}", accepted);
        assert!(accepted >= 9, "accepted {}", accepted);
    }

    #[test]
    fn test_readiness_gate_leaves_state_alone() {
        let mut s = scheduler(vec![Ok(Some(0.15)), Ok(Some(0.15))]);
        let t0 = Instant::now();
        s.tick(t0);
        let before = s.snapshot();

        s.source_mut().set_paused(true);
        assert_eq!(
            s.poll(t0 + Duration::from_secs(3)),
            TickOutcome::SourceNotReady(Readiness::Paused)
        );
        assert_eq!(s.snapshot(), before);
        assert_eq!(s.provider_mut().calls, 1);

        s.source_mut().set_paused(false);
        s.source_mut().set_extent(0, 0);
        assert_eq!(
            s.poll(t0 + Duration::from_secs(3)),
            TickOutcome::SourceNotReady(Readiness::ZeroExtent)
        );
        assert_eq!(s.snapshot(), before);
    }

    /// Source that claims readiness but hands out empty frames
    struct EmptyFrames;

    impl FrameSource for EmptyFrames {
        fn readiness(&self) -> Readiness {
            Readiness::Ready
        }

        fn current_frame(&mut self) -> Option<VideoFrame> {
            Some(VideoFrame::blank(0, 0, Duration::from_millis(33), 1))
        }
    }

    #[test]
    fn test_empty_frame_is_not_classified() {
        let mut s = SampleScheduler::new(
            &DmsConfig::default(),
            EmptyFrames,
            Scripted::new(vec![Ok(Some(0.3))]),
        );
        assert_eq!(
            s.poll(Instant::now()),
            TickOutcome::SourceNotReady(Readiness::ZeroExtent)
        );
        assert_eq!(s.provider_mut().calls, 0);
        assert_eq!(s.snapshot().last_sample, None);
    }

    #[test]
    fn test_not_started_source_is_not_no_face() {
        let mut s = SampleScheduler::new(
            &DmsConfig::default(),
            SyntheticSource::manual(640, 480),
            Scripted::new(vec![Ok(Some(0.3))]),
        );
        let t0 = Instant::now();
        assert_eq!(s.poll(t0), TickOutcome::SourceNotReady(Readiness::NotStarted));
        assert_eq!(s.current_status(), DriverStatus::NoFace);
        assert_eq!(s.snapshot().last_sample, None);

        s.source_mut().advance(Duration::from_millis(33));
        assert_eq!(s.tick(t0 + Duration::from_millis(33)).unwrap().status, DriverStatus::Alert);
    }

    #[test]
    fn test_transient_failure_backoff() {
        let mut s = scheduler(vec![Ok(Some(0.3)), transient(), Ok(Some(0.3))]);
        let t0 = Instant::now();
        s.tick(t0);

        let failed_at = t0 + TICK;
        assert_eq!(s.poll(failed_at), TickOutcome::DetectorFailed);
        assert_eq!(s.current_status(), DriverStatus::Alert);

        assert_eq!(s.poll(failed_at + TICK), TickOutcome::BackingOff);
        assert_eq!(s.poll(failed_at + Duration::from_millis(999)), TickOutcome::BackingOff);
        assert_eq!(s.provider_mut().calls, 2);

        let event = s.tick(failed_at + Duration::from_millis(1000)).unwrap();
        assert_eq!(event.status, DriverStatus::Alert);
        assert_eq!(s.provider_mut().calls, 3);
    }

    #[test]
    fn test_failure_does_not_reset_run() {
        let mut s = scheduler(vec![Ok(Some(0.15)), transient(), Ok(Some(0.15))]);
        let t0 = Instant::now();
        s.tick(t0);
        s.tick(t0 + TICK);
        let event = s.tick(t0 + Duration::from_millis(2200)).unwrap();
        assert_eq!(s.snapshot().run_started, Some(t0));
        assert_eq!(event.status, DriverStatus::Critical);
    }

    #[test]
    fn test_sinks_receive_every_classified_tick() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut s = scheduler(vec![Ok(None), Ok(Some(0.3)), transient(), Ok(Some(0.3))]);
        let log = seen.clone();
        s.add_sink(move |e: &StatusEvent| log.lock().unwrap().push(e.status));

        let t0 = Instant::now();
        for i in 0..4u32 {
            s.tick(t0 + TICK * i);
        }
        s.tick(t0 + Duration::from_secs(2));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![DriverStatus::NoFace, DriverStatus::Alert, DriverStatus::Alert]
        );
    }

    #[test]
    fn test_no_face_event_has_zero_ear() {
        let mut s = scheduler(vec![Ok(None)]);
        let event = s.tick(Instant::now()).unwrap();
        assert_eq!(event.status, DriverStatus::NoFace);
        assert_eq!(event.ear, 0.0);
    }
}
