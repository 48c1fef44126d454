use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use thiserror::Error;

use crate::capture::domain::capture_source::CaptureSource;
use crate::config::app_config::AppConfig;
use crate::recording::domain::output_spec::{OutputSpec, OutputSpecError};
use crate::recording::domain::recorder_state::RecordingController;
use crate::recording::domain::recording_session::{
    RecordingSession, SealedRecording, SessionError,
};
use crate::shared::constants::{FACESWAP_PREFIX, MAX_OUTPUT_FRAMES, RECORDED_PREFIX};
use crate::shared::output_paths;
use crate::swap::domain::face::Face;
use crate::swap::domain::face_engine::FaceEngine;
use crate::upload::domain::upload_service::UploadService;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;
use crate::video::infrastructure::image_loader;

use super::infrastructure::swap_worker::{self, SwapJob, WorkerMessage};
use super::load_source_face_use_case::{LoadSourceFaceUseCase, SourceFaceError};
use super::record_video_use_case::{
    RecordError, RecordProgressFn, RecordVideoUseCase, RecordingOutcome,
};
use super::swap_recording_use_case::SwapReport;

pub type EngineFactory =
    Box<dyn Fn() -> Result<Box<dyn FaceEngine>, Box<dyn std::error::Error>> + Send + Sync>;
pub type WriterFactory = Box<dyn Fn() -> Box<dyn VideoWriter> + Send + Sync>;

#[derive(Error, Debug)]
pub enum StudioError {
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    SourceFace(#[from] SourceFaceError),
    #[error(transparent)]
    Output(#[from] OutputSpecError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("cannot prepare output file: {0}")]
    OutputPath(#[from] std::io::Error),
    #[error("failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },
    #[error("face engine unavailable: {0}")]
    Engine(String),
    #[error("nothing has been recorded yet")]
    NoRecording,
}

/// How a swap request was fulfilled.
pub enum SwapStart {
    /// A worker is running; poll the receiver, set the flag to cancel.
    Worker {
        messages: Receiver<WorkerMessage>,
        cancelled: Arc<AtomicBool>,
        output_path: PathBuf,
    },
    /// No source face is loaded, so the recording itself is the result.
    Passthrough(PathBuf),
}

/// One user's record, swap and upload flow.
///
/// Holds the recording controller, the loaded source face and the paths of
/// the last recorded and processed files. A swap always works on the last
/// sealed recording, never on a buffer that is still being filled.
pub struct StudioSession {
    config: AppConfig,
    controller: Arc<RecordingController>,
    engine_factory: EngineFactory,
    writer_factory: WriterFactory,
    uploader: Box<dyn UploadService>,
    source_loader: Option<LoadSourceFaceUseCase>,
    source_face: Option<Face>,
    last_recording: Option<SealedRecording>,
    recorded_path: Option<PathBuf>,
    processed_path: Option<PathBuf>,
    processed_is_synthetic: bool,
}

impl StudioSession {
    pub fn new(
        config: AppConfig,
        engine_factory: EngineFactory,
        writer_factory: WriterFactory,
        uploader: Box<dyn UploadService>,
    ) -> Self {
        Self {
            config,
            controller: Arc::new(RecordingController::new()),
            engine_factory,
            writer_factory,
            uploader,
            source_loader: None,
            source_face: None,
            last_recording: None,
            recorded_path: None,
            processed_path: None,
            processed_is_synthetic: false,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Shared handle for stopping a recording from another thread.
    pub fn controller(&self) -> Arc<RecordingController> {
        self.controller.clone()
    }

    pub fn source_face(&self) -> Option<&Face> {
        self.source_face.as_ref()
    }

    pub fn last_recording(&self) -> Option<&SealedRecording> {
        self.last_recording.as_ref()
    }

    pub fn recorded_path(&self) -> Option<&Path> {
        self.recorded_path.as_deref()
    }

    pub fn processed_path(&self) -> Option<&Path> {
        self.processed_path.as_deref()
    }

    pub fn load_source_face(&mut self, image_path: &Path) -> Result<&Face, StudioError> {
        if self.source_loader.is_none() {
            let engine = (self.engine_factory)().map_err(|e| StudioError::Engine(e.to_string()))?;
            self.source_loader = Some(LoadSourceFaceUseCase::new(
                engine,
                self.config.engine.clone(),
                image_loader::load_image_frame,
            ));
        }
        let loader = self
            .source_loader
            .as_mut()
            .ok_or_else(|| StudioError::Engine("source face loader missing".into()))?;

        let face = loader.execute(image_path)?;
        log::info!("Source face loaded from {}", image_path.display());
        Ok(&*self.source_face.insert(face))
    }

    pub fn clear_source_face(&mut self) {
        self.source_face = None;
    }

    /// Records from `source` into `output`, or a new timestamped file in
    /// the output directory. Blocks until the recording stops.
    pub fn record(
        &mut self,
        source: Box<dyn CaptureSource>,
        output: Option<&Path>,
        on_progress: Option<RecordProgressFn>,
    ) -> Result<RecordingOutcome, StudioError> {
        let spec = self.config.output_spec()?;
        let output_path = match output {
            Some(path) => path.to_path_buf(),
            None => {
                output_paths::timestamped(&self.config.recording.output_dir, RECORDED_PREFIX)?
            }
        };

        let mut use_case =
            RecordVideoUseCase::new(source, (self.writer_factory)(), self.controller.clone(), spec)
                .with_capture_fps(self.config.capture.fps)
                .with_max_consecutive_failures(self.config.capture.max_consecutive_read_failures);
        if let Some(cb) = on_progress {
            use_case = use_case.with_progress(cb);
        }

        let outcome = use_case.execute(&output_path)?;
        self.last_recording = Some(outcome.recording.clone());
        self.recorded_path = Some(outcome.output_path.clone());
        self.processed_path = None;
        self.processed_is_synthetic = false;
        Ok(outcome)
    }

    /// Uses an existing video file as the last recording, at its own
    /// frame rate and length.
    pub fn load_recording(
        &mut self,
        mut reader: Box<dyn VideoReader>,
        path: &Path,
    ) -> Result<&SealedRecording, StudioError> {
        let read_error = |e: Box<dyn std::error::Error>| StudioError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        let metadata = reader.open(path).map_err(read_error)?;
        let frames: Result<Vec<_>, _> = reader.frames().take(MAX_OUTPUT_FRAMES + 1).collect();
        reader.close();
        let frames = frames.map_err(read_error)?;
        if frames.is_empty() {
            return Err(read_error("no frames decoded".into()));
        }
        if frames.len() > MAX_OUTPUT_FRAMES {
            return Err(read_error(
                format!("more than {MAX_OUTPUT_FRAMES} frames; use retime for long videos").into(),
            ));
        }

        let fps = if metadata.fps > 0.0 {
            metadata.fps
        } else {
            self.config.recording.target_fps
        };
        let spec = OutputSpec::new(fps, frames.len() as f64 / fps)?;
        let mut session = RecordingSession::new(spec);
        for frame in frames {
            session.push(frame)?;
        }
        let elapsed = spec.duration();

        self.recorded_path = Some(path.to_path_buf());
        self.processed_path = None;
        self.processed_is_synthetic = false;
        Ok(&*self.last_recording.insert(session.seal(elapsed)))
    }

    /// Starts the swap pass on the last recording.
    pub fn start_swap(&mut self) -> Result<SwapStart, StudioError> {
        let recording = self.last_recording.clone().ok_or(StudioError::NoRecording)?;

        let Some(source_face) = self.source_face.clone() else {
            let recorded = self.recorded_path.clone().ok_or(StudioError::NoRecording)?;
            log::info!("No source face loaded; using the recording as the result");
            self.processed_path = Some(recorded.clone());
            self.processed_is_synthetic = false;
            return Ok(SwapStart::Passthrough(recorded));
        };

        let engine = (self.engine_factory)().map_err(|e| StudioError::Engine(e.to_string()))?;
        let output_path =
            output_paths::timestamped(&self.config.recording.output_dir, FACESWAP_PREFIX)?;
        let (messages, cancelled) = swap_worker::spawn(SwapJob {
            engine,
            writer: (self.writer_factory)(),
            config: self.config.engine.clone(),
            source_face,
            recording,
            output_path: output_path.clone(),
        });
        Ok(SwapStart::Worker {
            messages,
            cancelled,
            output_path,
        })
    }

    /// Records the result of a finished worker.
    pub fn complete_swap(&mut self, report: &SwapReport) {
        self.processed_path = Some(report.output_path.clone());
        self.processed_is_synthetic = report.swapped_frames > 0;
    }

    pub fn upload_recorded(&self) -> bool {
        match &self.recorded_path {
            Some(path) => self.uploader.upload(path, false),
            None => {
                log::warn!("Nothing recorded to upload");
                false
            }
        }
    }

    pub fn upload_processed(&self) -> bool {
        match &self.processed_path {
            Some(path) => self.uploader.upload(path, self.processed_is_synthetic),
            None => {
                log::warn!("No processed video to upload");
                false
            }
        }
    }
}
