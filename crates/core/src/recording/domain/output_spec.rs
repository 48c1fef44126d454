use std::num::NonZeroUsize;
use std::time::Duration;

use thiserror::Error;

use crate::shared::constants::MAX_OUTPUT_FRAMES;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OutputSpecError {
    #[error("target fps must be a positive finite number, got {0}")]
    InvalidFps(f64),
    #[error("target duration must be a positive finite number of seconds, got {0}")]
    InvalidDuration(f64),
    #[error("{fps} fps for {duration_secs}s rounds to zero output frames")]
    NoFrames { fps: f64, duration_secs: f64 },
    #[error("{fps} fps for {duration_secs}s exceeds the limit of {max} output frames")]
    TooManyFrames {
        fps: f64,
        duration_secs: f64,
        max: usize,
    },
}

/// Declared frame rate and duration every output file must exhibit,
/// independent of how fast frames were actually captured.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutputSpec {
    fps: f64,
    duration_secs: f64,
    duration: Duration,
    frame_count: NonZeroUsize,
}

impl OutputSpec {
    pub fn new(fps: f64, duration_secs: f64) -> Result<Self, OutputSpecError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(OutputSpecError::InvalidFps(fps));
        }
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(OutputSpecError::InvalidDuration(duration_secs));
        }
        let rounded = (fps * duration_secs).round();
        if rounded > MAX_OUTPUT_FRAMES as f64 {
            return Err(OutputSpecError::TooManyFrames {
                fps,
                duration_secs,
                max: MAX_OUTPUT_FRAMES,
            });
        }
        let frame_count = NonZeroUsize::new(rounded as usize)
            .ok_or(OutputSpecError::NoFrames { fps, duration_secs })?;
        let duration = Duration::try_from_secs_f64(duration_secs)
            .map_err(|_| OutputSpecError::InvalidDuration(duration_secs))?;
        Ok(Self {
            fps,
            duration_secs,
            duration,
            frame_count,
        })
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// `round(fps * duration)`, fixed regardless of how many frames were captured.
    pub fn frame_count(&self) -> NonZeroUsize {
        self.frame_count
    }
}
