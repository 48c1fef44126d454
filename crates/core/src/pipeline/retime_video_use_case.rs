use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::recording::domain::frame_rate_normalizer::{self, EmptyCaptureError};
use crate::recording::domain::output_spec::OutputSpec;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

#[derive(Error, Debug)]
pub enum RetimeError {
    #[error("failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },
    #[error("{0} contains no frames")]
    EmptyInput(PathBuf),
    #[error("frame {index} is {got_w}x{got_h}, expected {want_w}x{want_h}")]
    DimensionMismatch {
        index: usize,
        want_w: u32,
        want_h: u32,
        got_w: u32,
        got_h: u32,
    },
    #[error("failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetimeOutcome {
    pub source_frames: usize,
    pub source_fps: f64,
    pub written_frames: usize,
}

/// Re-times an existing video file to a fixed frame rate and duration.
///
/// The input is decoded twice: once to count frames and check their size,
/// then again to write the selected frames as they stream past. At most one
/// decoded frame is held at a time, whatever the input length.
pub struct RetimeVideoUseCase {
    reader: Box<dyn VideoReader>,
    writer: Box<dyn VideoWriter>,
    spec: OutputSpec,
}

struct InputScan {
    fps: f64,
    frames: usize,
    dimensions: (u32, u32),
}

impl RetimeVideoUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        spec: OutputSpec,
    ) -> Self {
        Self {
            reader,
            writer,
            spec,
        }
    }

    pub fn execute(
        &mut self,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<RetimeOutcome, RetimeError> {
        let scan = self.scan(input_path)?;
        let indices = frame_rate_normalizer::source_indices(scan.frames, self.spec.frame_count())
            .map_err(|_: EmptyCaptureError| RetimeError::EmptyInput(input_path.to_path_buf()))?;

        log::info!(
            "Re-timing {} frames ({:.2} fps) to {} frames at {} fps",
            scan.frames,
            scan.fps,
            indices.len(),
            self.spec.fps()
        );

        let written_frames = self.stream(input_path, output_path, &scan, &indices)?;

        Ok(RetimeOutcome {
            source_frames: scan.frames,
            source_fps: scan.fps,
            written_frames,
        })
    }

    /// First pass: frame count and size, nothing kept.
    fn scan(&mut self, input_path: &Path) -> Result<InputScan, RetimeError> {
        let metadata = self
            .reader
            .open(input_path)
            .map_err(|e| read_error(input_path, e))?;

        let mut frames = 0usize;
        let mut dimensions: Option<(u32, u32)> = None;
        let result = self.reader.frames().try_for_each(|frame| {
            let frame = frame.map_err(|e| read_error(input_path, e))?;
            let (got_w, got_h) = frame.dimensions();
            match dimensions {
                Some((want_w, want_h)) if (want_w, want_h) != (got_w, got_h) => {
                    return Err(RetimeError::DimensionMismatch {
                        index: frames,
                        want_w,
                        want_h,
                        got_w,
                        got_h,
                    });
                }
                Some(_) => {}
                None => dimensions = Some((got_w, got_h)),
            }
            frames += 1;
            Ok(())
        });
        self.reader.close();
        result?;

        let dimensions =
            dimensions.ok_or_else(|| RetimeError::EmptyInput(input_path.to_path_buf()))?;
        Ok(InputScan {
            fps: metadata.fps,
            frames,
            dimensions,
        })
    }

    /// Second pass: writes each decoded frame once per time it is selected.
    /// `indices` is non-decreasing, so decoding stops after the last one.
    fn stream(
        &mut self,
        input_path: &Path,
        output_path: &Path,
        scan: &InputScan,
        indices: &[usize],
    ) -> Result<usize, RetimeError> {
        let write_error = |e: Box<dyn std::error::Error>| RetimeError::Write {
            path: output_path.to_path_buf(),
            message: e.to_string(),
        };

        self.reader
            .open(input_path)
            .map_err(|e| read_error(input_path, e))?;
        let (width, height) = scan.dimensions;
        let metadata = VideoMetadata::for_output(width, height, self.spec.fps(), indices.len());
        if let Err(e) = self.writer.open(output_path, &metadata) {
            self.reader.close();
            return Err(write_error(e));
        }

        let mut next = 0usize;
        let mut result = Ok(());
        for (position, frame) in self.reader.frames().enumerate() {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    result = Err(read_error(input_path, e));
                    break;
                }
            };
            while next < indices.len() && indices[next] == position {
                if let Err(e) = self.writer.write(&frame) {
                    result = Err(write_error(e));
                    break;
                }
                next += 1;
            }
            if result.is_err() || next == indices.len() {
                break;
            }
        }
        self.reader.close();
        let closed = self.writer.close();

        result?;
        closed.map_err(write_error)?;
        if next < indices.len() {
            return Err(RetimeError::Read {
                path: input_path.to_path_buf(),
                message: format!(
                    "input ended early on the second pass ({} of {} frames written)",
                    next,
                    indices.len()
                ),
            });
        }
        Ok(next)
    }
}

fn read_error(path: &Path, e: Box<dyn std::error::Error>) -> RetimeError {
    RetimeError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}
