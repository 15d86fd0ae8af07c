//! Capture source contract and scoped ownership

use std::fmt;

use tracing::{debug, info};

use crate::{CameraError, VideoFrame};

/// Liveness of a capture source at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// A decodable frame with real extent is available
    Ready,
    /// No decodable frame yet (stream still negotiating)
    NotDecodable,
    /// Stream reports a zero width or height
    ZeroExtent,
    /// Playback is paused or has ended
    Paused,
    /// Playback has not advanced past time zero
    NotStarted,
}

impl Readiness {
    pub fn is_ready(self) -> bool {
        self == Readiness::Ready
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Readiness::Ready => "ready",
            Readiness::NotDecodable => "not decodable",
            Readiness::ZeroExtent => "zero extent",
            Readiness::Paused => "paused",
            Readiness::NotStarted => "not started",
        };
        f.write_str(reason)
    }
}

/// A live frame source (camera, file, synthetic)
pub trait FrameSource {
    /// Report whether a frame can be taken right now
    fn readiness(&self) -> Readiness;

    /// Take the current frame. Only meaningful when [`readiness`](Self::readiness)
    /// reports `Ready`; `None` is treated as not ready by callers.
    fn current_frame(&mut self) -> Option<VideoFrame>;

    /// Give the underlying device back. Called exactly once by [`SourceGuard`].
    fn release(&mut self) {}
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn readiness(&self) -> Readiness {
        (**self).readiness()
    }

    fn current_frame(&mut self) -> Option<VideoFrame> {
        (**self).current_frame()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// Exclusive, scoped ownership of an acquired source.
///
/// The source is released when the guard is dropped or [`release`](Self::release)d.
/// A failed acquisition never produces a guard, so there is nothing to undo.
pub struct SourceGuard<S: FrameSource> {
    name: String,
    source: Option<S>,
}

impl<S: FrameSource> SourceGuard<S> {
    /// Acquire a source through `open`, surfacing its failure unchanged
    pub fn acquire<F>(name: impl Into<String>, open: F) -> Result<Self, CameraError>
    where
        F: FnOnce() -> Result<S, CameraError>,
    {
        let name = name.into();
        let source = open()?;
        info!("Capture source '{}' acquired", name);
        Ok(Self {
            name,
            source: Some(source),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self) -> Option<&S> {
        self.source.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut S> {
        self.source.as_mut()
    }

    /// Release the source now instead of at drop
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.release();
            info!("Capture source '{}' released", self.name);
        }
    }
}

impl<S: FrameSource> FrameSource for SourceGuard<S> {
    fn readiness(&self) -> Readiness {
        match &self.source {
            Some(source) => source.readiness(),
            None => Readiness::NotDecodable,
        }
    }

    fn current_frame(&mut self) -> Option<VideoFrame> {
        self.source.as_mut().and_then(|s| s.current_frame())
    }

    fn release(&mut self) {
        self.release_inner();
    }
}

impl<S: FrameSource> Drop for SourceGuard<S> {
    fn drop(&mut self) {
        if self.source.is_some() {
            debug!("Dropping guard for '{}'", self.name);
        }
        self.release_inner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    struct CountingSource {
        releases: Rc<Cell<u32>>,
    }

    impl FrameSource for CountingSource {
        fn readiness(&self) -> Readiness {
            Readiness::Ready
        }

        fn current_frame(&mut self) -> Option<VideoFrame> {
            Some(VideoFrame::blank(2, 2, Duration::from_millis(1), 0))
        }

        fn release(&mut self) {
            self.releases.set(self.releases.get() + 1);
        }
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let releases = Rc::new(Cell::new(0));
        {
            let counter = releases.clone();
            let guard = SourceGuard::acquire("cabin", move || {
                Ok(CountingSource { releases: counter })
            })
            .unwrap();
            assert_eq!(guard.name(), "cabin");
            assert_eq!(releases.get(), 0);
        }
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn test_explicit_release_happens_once() {
        let releases = Rc::new(Cell::new(0));
        let counter = releases.clone();
        let mut guard =
            SourceGuard::acquire("cabin", move || Ok(CountingSource { releases: counter })).unwrap();

        FrameSource::release(&mut guard);
        assert_eq!(guard.readiness(), Readiness::NotDecodable);
        assert!(guard.current_frame().is_none());
        drop(guard);
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn test_failed_acquisition_surfaces_error() {
        let result: Result<SourceGuard<CountingSource>, _> =
            SourceGuard::acquire("cabin", || Err(CameraError::PermissionDenied("user".into())));
        assert!(matches!(result, Err(CameraError::PermissionDenied(_))));
    }
}
