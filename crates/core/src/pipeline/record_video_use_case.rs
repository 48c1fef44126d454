use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::capture::domain::capture_source::{CaptureError, CaptureSource};
use crate::recording::domain::capture_pacer::{CapturePacer, Clock, SystemClock};
use crate::recording::domain::frame_rate_normalizer::EmptyCaptureError;
use crate::recording::domain::output_spec::OutputSpec;
use crate::recording::domain::recorder_state::{RecorderError, RecordingController, StopReason};
use crate::recording::domain::recording_session::{
    RecordingSession, SealedRecording, SessionError,
};
use crate::shared::constants::DEFAULT_MAX_READ_FAILURES;
use crate::shared::frame::Frame;
use crate::video::domain::video_writer::VideoWriter;

use super::normalized_export;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error(transparent)]
    Recorder(#[from] RecorderError),
    #[error("capture failed: {0}")]
    CaptureFailed(String),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("no frames were captured")]
    EmptyCapture,
    #[error("failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },
}

impl From<EmptyCaptureError> for RecordError {
    fn from(_: EmptyCaptureError) -> Self {
        RecordError::EmptyCapture
    }
}

/// Live view of an in-progress recording, handed to the progress callback
/// after every captured frame.
pub struct RecordProgress<'a> {
    pub frame: &'a Frame,
    pub captured: usize,
    pub elapsed: Duration,
    pub remaining: Duration,
}

/// Returning `false` requests a manual stop.
pub type RecordProgressFn = Box<dyn Fn(&RecordProgress<'_>) -> bool + Send>;

#[derive(Debug)]
pub struct RecordingOutcome {
    pub output_path: PathBuf,
    pub recording: SealedRecording,
    pub stop_reason: StopReason,
    pub written_frames: usize,
}

/// Captures for the configured duration, then writes the recording
/// re-timed to exactly `fps * duration` frames.
pub struct RecordVideoUseCase {
    source: Box<dyn CaptureSource>,
    writer: Box<dyn VideoWriter>,
    clock: Box<dyn Clock>,
    controller: Arc<RecordingController>,
    spec: OutputSpec,
    capture_fps: f64,
    max_consecutive_failures: usize,
    on_progress: Option<RecordProgressFn>,
}

impl RecordVideoUseCase {
    pub fn new(
        source: Box<dyn CaptureSource>,
        writer: Box<dyn VideoWriter>,
        controller: Arc<RecordingController>,
        spec: OutputSpec,
    ) -> Self {
        Self {
            source,
            writer,
            clock: Box::new(SystemClock),
            controller,
            spec,
            capture_fps: spec.fps(),
            max_consecutive_failures: DEFAULT_MAX_READ_FAILURES,
            on_progress: None,
        }
    }

    /// Rate the camera is polled at; defaults to the target fps.
    pub fn with_capture_fps(mut self, fps: f64) -> Self {
        self.capture_fps = fps;
        self
    }

    pub fn with_max_consecutive_failures(mut self, max: usize) -> Self {
        self.max_consecutive_failures = max;
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_progress(mut self, on_progress: RecordProgressFn) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn execute(&mut self, output_path: &Path) -> Result<RecordingOutcome, RecordError> {
        self.controller.start()?;
        log::info!(
            "Recording {:.1}s at {} fps ({} output frames)",
            self.spec.duration_secs(),
            self.spec.fps(),
            self.spec.frame_count()
        );

        let result = match self.capture() {
            Ok((recording, stop_reason)) => self.finalize(recording, stop_reason, output_path),
            Err(e) => Err(e),
        };
        if result.is_err() {
            self.controller.abort();
        }
        result
    }

    fn capture(&mut self) -> Result<(SealedRecording, StopReason), RecordError> {
        let clock = &*self.clock;
        let duration = self.spec.duration();
        let mut pacer = CapturePacer::new(self.capture_fps);
        let mut session = RecordingSession::new(self.spec);
        let mut failures = 0usize;
        let started_at = clock.now();

        let stop_reason = loop {
            pacer.wait(clock);

            // Checked after the wait so a slot that falls due at or past the
            // deadline is never read.
            if let Some(reason) = self
                .controller
                .stop_reason(started_at, clock.now(), duration)
            {
                break reason;
            }

            let frame = match self.source.read() {
                Ok(frame) => frame,
                Err(CaptureError::Closed) => break StopReason::SourceClosed,
                Err(e) if e.is_transient() => {
                    failures += 1;
                    if failures > self.max_consecutive_failures {
                        return Err(RecordError::CaptureFailed(format!(
                            "{failures} consecutive failed reads, last: {e}"
                        )));
                    }
                    log::debug!("Transient capture failure ({failures}): {e}");
                    continue;
                }
                Err(e) => return Err(RecordError::CaptureFailed(e.to_string())),
            };
            failures = 0;

            if let Some(cb) = &self.on_progress {
                let elapsed = clock.now().saturating_duration_since(started_at);
                let progress = RecordProgress {
                    frame: &frame,
                    captured: session.len() + 1,
                    elapsed,
                    remaining: duration.saturating_sub(elapsed),
                };
                if !cb(&progress) {
                    let _ = self.controller.request_stop();
                }
            }
            session.push(frame)?;
        };

        let elapsed = clock.now().saturating_duration_since(started_at);
        let recording = session.seal(elapsed);
        log::info!(
            "Captured {} frames in {:.2}s ({:.1} fps), stopped: {:?}",
            recording.captured_count(),
            elapsed.as_secs_f64(),
            recording.capture_rate(),
            stop_reason
        );
        Ok((recording, stop_reason))
    }

    fn finalize(
        &mut self,
        recording: SealedRecording,
        stop_reason: StopReason,
        output_path: &Path,
    ) -> Result<RecordingOutcome, RecordError> {
        self.controller.begin_finalizing(stop_reason)?;
        let indices = recording.normalized_indices()?;

        let written_frames = normalized_export::write_sequence(
            self.writer.as_mut(),
            output_path,
            recording.spec(),
            recording.frames(),
            &indices,
        )
        .map_err(|e| RecordError::Write {
            path: output_path.to_path_buf(),
            message: e.to_string(),
        })?;

        self.controller.finish()?;
        log::info!(
            "Wrote {written_frames} frames at {} fps to {}",
            recording.spec().fps(),
            output_path.display()
        );

        Ok(RecordingOutcome {
            output_path: output_path.to_path_buf(),
            recording,
            stop_reason,
            written_frames,
        })
    }
}
