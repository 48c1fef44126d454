use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::frame_rate_normalizer::{self, EmptyCaptureError};
use super::output_spec::OutputSpec;
use crate::shared::frame::Frame;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("frame is {got_w}x{got_h} but this session records {want_w}x{want_h}")]
    DimensionMismatch {
        want_w: u32,
        want_h: u32,
        got_w: u32,
        got_h: u32,
    },
}

/// Frames gathered between a start and a stop event.
///
/// Owned exclusively by the recording workflow while it is live. Frames are
/// re-indexed in arrival order as they are pushed. `seal` consumes the
/// session, so nothing can append to a buffer that a background pass reads.
pub struct RecordingSession {
    spec: OutputSpec,
    frames: Vec<Frame>,
    dimensions: Option<(u32, u32)>,
}

impl RecordingSession {
    pub fn new(spec: OutputSpec) -> Self {
        Self {
            spec,
            frames: Vec::new(),
            dimensions: None,
        }
    }

    pub fn spec(&self) -> &OutputSpec {
        &self.spec
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Appends a frame. The first frame fixes the session's dimensions.
    pub fn push(&mut self, frame: Frame) -> Result<(), SessionError> {
        let (got_w, got_h) = frame.dimensions();
        match self.dimensions {
            Some((want_w, want_h)) if (want_w, want_h) != (got_w, got_h) => {
                return Err(SessionError::DimensionMismatch {
                    want_w,
                    want_h,
                    got_w,
                    got_h,
                });
            }
            Some(_) => {}
            None => self.dimensions = Some((got_w, got_h)),
        }
        let index = self.frames.len();
        self.frames.push(frame.with_index(index));
        Ok(())
    }

    pub fn seal(self, elapsed: Duration) -> SealedRecording {
        SealedRecording {
            spec: self.spec,
            frames: self.frames.into(),
            elapsed,
        }
    }
}

/// An immutable, shareable snapshot of a finished recording.
///
/// Cloning is cheap; clones share the same frame buffer.
#[derive(Clone, Debug)]
pub struct SealedRecording {
    spec: OutputSpec,
    frames: Arc<[Frame]>,
    elapsed: Duration,
}

impl SealedRecording {
    pub fn spec(&self) -> &OutputSpec {
        &self.spec
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn captured_count(&self) -> usize {
        self.frames.len()
    }

    /// Wall-clock time between start and stop.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Rate frames actually arrived at, or 0 when nothing was measured.
    pub fn capture_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames.len() as f64 / secs
        } else {
            0.0
        }
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.frames.first().map(Frame::dimensions)
    }

    /// The recording re-timed to its declared frame count.
    pub fn normalized(&self) -> Result<Vec<&Frame>, EmptyCaptureError> {
        frame_rate_normalizer::normalize(&self.frames, self.spec.frame_count())
    }

    /// Source indices of the normalized sequence.
    pub fn normalized_indices(&self) -> Result<Vec<usize>, EmptyCaptureError> {
        frame_rate_normalizer::source_indices(self.frames.len(), self.spec.frame_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn frame(w: u32, h: u32, value: u8) -> Frame {
        Frame::new(vec![value; (w * h * 3) as usize], w, h, 3, 99)
    }

    fn spec(fps: f64, secs: f64) -> OutputSpec {
        OutputSpec::new(fps, secs).unwrap()
    }

    #[test]
    fn test_push_reindexes_in_arrival_order() {
        let mut session = RecordingSession::new(spec(30.0, 1.0));
        session.push(frame(4, 2, 1)).unwrap();
        session.push(frame(4, 2, 2)).unwrap();
        let sealed = session.seal(Duration::from_secs(1));
        let indices: Vec<_> = sealed.frames().iter().map(Frame::index).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_push_rejects_dimension_change() {
        let mut session = RecordingSession::new(spec(30.0, 1.0));
        session.push(frame(4, 2, 0)).unwrap();
        let err = session.push(frame(2, 2, 0)).unwrap_err();
        assert_eq!(
            err,
            SessionError::DimensionMismatch {
                want_w: 4,
                want_h: 2,
                got_w: 2,
                got_h: 2
            }
        );
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_normalized_has_declared_length() {
        let mut session = RecordingSession::new(spec(10.0, 1.0));
        for i in 0..3 {
            session.push(frame(2, 2, i)).unwrap();
        }
        let sealed = session.seal(Duration::from_secs(1));
        let normalized = sealed.normalized().unwrap();
        assert_eq!(normalized.len(), 10);
        assert_eq!(normalized[0].data()[0], 0);
        assert_eq!(normalized[9].data()[0], 2);
    }

    #[test]
    fn test_empty_session_fails_to_normalize() {
        let sealed = RecordingSession::new(spec(30.0, 10.0)).seal(Duration::from_secs(10));
        assert!(sealed.normalized().is_err());
        assert!(sealed.dimensions().is_none());
    }

    #[test]
    fn test_clones_share_frames() {
        let mut session = RecordingSession::new(spec(30.0, 1.0));
        session.push(frame(2, 2, 5)).unwrap();
        let sealed = session.seal(Duration::from_millis(500));
        let clone = sealed.clone();
        assert!(std::ptr::eq(sealed.frames(), clone.frames()));
    }

    #[test]
    fn test_capture_rate() {
        let mut session = RecordingSession::new(spec(30.0, 10.0));
        for _ in 0..95 {
            session.push(frame(2, 2, 0)).unwrap();
        }
        let sealed = session.seal(Duration::from_secs(10));
        assert_relative_eq!(sealed.capture_rate(), 9.5);
    }
}
