use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::recording::domain::recording_session::SealedRecording;
use crate::shared::frame::Frame;
use crate::swap::domain::engine_config::{EngineConfig, FaceSelectorMode};
use crate::swap::domain::face::Face;
use crate::swap::domain::face_engine::FaceEngine;
use crate::swap::domain::face_selector::FaceSelector;
use crate::swap::domain::swap_outcome::FrameSwapper;
use crate::video::domain::video_writer::VideoWriter;

use super::normalized_export;

#[derive(Error, Debug)]
pub enum SwapError {
    #[error("recording has no frames")]
    EmptyRecording,
    #[error("face engine configuration failed: {0}")]
    Engine(String),
    #[error("swap cancelled")]
    Cancelled,
    #[error("failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapProgress {
    /// Distinct source frames processed so far.
    pub processed: usize,
    pub total: usize,
    pub swapped: usize,
    pub elapsed: Duration,
    pub fps: f64,
}

/// Returning `false` cancels the pass.
pub type SwapProgressFn = Box<dyn Fn(&SwapProgress) -> bool + Send>;

#[derive(Debug, Clone, PartialEq)]
pub struct SwapReport {
    pub output_path: PathBuf,
    pub written_frames: usize,
    pub unique_frames: usize,
    pub swapped_frames: usize,
}

/// Swaps the source face into a sealed recording and writes the result at
/// the recording's declared rate and length.
///
/// Frames the normalizer repeats are processed once, so a short capture
/// stretched to the target length costs no extra engine calls.
pub struct SwapRecordingUseCase {
    engine: Box<dyn FaceEngine>,
    writer: Box<dyn VideoWriter>,
    config: EngineConfig,
    source_face: Face,
    on_progress: Option<SwapProgressFn>,
    cancelled: Arc<AtomicBool>,
}

impl SwapRecordingUseCase {
    pub fn new(
        engine: Box<dyn FaceEngine>,
        writer: Box<dyn VideoWriter>,
        config: EngineConfig,
        source_face: Face,
        on_progress: Option<SwapProgressFn>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            engine,
            writer,
            config,
            source_face,
            on_progress,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn execute(
        &mut self,
        recording: &SealedRecording,
        output_path: &Path,
    ) -> Result<SwapReport, SwapError> {
        let indices = recording
            .normalized_indices()
            .map_err(|_| SwapError::EmptyRecording)?;
        let (unique, positions) = dedup_indices(&indices);

        self.engine
            .configure(&self.config)
            .map_err(|e| SwapError::Engine(e.to_string()))?;

        let selector = FaceSelector::from_config(&self.config);
        let reference = self.reference_face(&selector, recording.frames(), &indices);
        let swapper =
            FrameSwapper::new(self.source_face.clone(), selector).with_reference(reference);

        log::info!(
            "Swapping {} distinct frames for {} output frames",
            unique.len(),
            indices.len()
        );

        let started = Instant::now();
        let mut processed: Vec<Frame> = Vec::with_capacity(unique.len());
        let mut swapped = 0usize;
        for &source_index in &unique {
            if self.cancelled.load(Ordering::Relaxed) {
                return Err(SwapError::Cancelled);
            }

            let outcome = swapper.apply(self.engine.as_mut(), &recording.frames()[source_index]);
            if outcome.is_swapped() {
                swapped += 1;
            }
            processed.push(outcome.into_frame());

            if let Some(cb) = &self.on_progress {
                let elapsed = started.elapsed();
                let progress = SwapProgress {
                    processed: processed.len(),
                    total: unique.len(),
                    swapped,
                    elapsed,
                    fps: rate(processed.len(), elapsed),
                };
                if !cb(&progress) {
                    self.cancelled.store(true, Ordering::Relaxed);
                    return Err(SwapError::Cancelled);
                }
            }
        }

        let written_frames = normalized_export::write_sequence(
            self.writer.as_mut(),
            output_path,
            recording.spec(),
            &processed,
            &positions,
        )
        .map_err(|e| SwapError::Write {
            path: output_path.to_path_buf(),
            message: e.to_string(),
        })?;

        log::info!(
            "Swapped {swapped}/{} frames in {:.2}s",
            unique.len(),
            started.elapsed().as_secs_f64()
        );

        Ok(SwapReport {
            output_path: output_path.to_path_buf(),
            written_frames,
            unique_frames: unique.len(),
            swapped_frames: swapped,
        })
    }

    /// In reference mode, the face to track is picked once from the
    /// configured frame of the output sequence.
    fn reference_face(
        &mut self,
        selector: &FaceSelector,
        frames: &[Frame],
        indices: &[usize],
    ) -> Option<Face> {
        if selector.mode() != FaceSelectorMode::Reference {
            return None;
        }
        let position = self.config.reference_frame_number.min(indices.len() - 1);
        let frame = &frames[indices[position]];
        match self.engine.detect(frame) {
            Ok(faces) => {
                let reference =
                    selector.pick_reference(faces, self.config.reference_face_position);
                if reference.is_none() {
                    log::warn!("No reference face in output frame {position}");
                }
                reference
            }
            Err(e) => {
                log::warn!("Reference face detection failed: {e}");
                None
            }
        }
    }
}

/// Splits a non-decreasing index list into its distinct values and, for
/// each entry, the position of its value in that list.
fn dedup_indices(indices: &[usize]) -> (Vec<usize>, Vec<usize>) {
    let mut unique: Vec<usize> = Vec::new();
    let mut positions = Vec::with_capacity(indices.len());
    for &i in indices {
        if unique.last() != Some(&i) {
            unique.push(i);
        }
        positions.push(unique.len() - 1);
    }
    (unique, positions)
}

fn rate(frames: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        frames as f64 / secs
    } else {
        0.0
    }
}
