use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};

use crate::pipeline::swap_recording_use_case::{
    SwapError, SwapProgress, SwapProgressFn, SwapRecordingUseCase, SwapReport,
};
use crate::recording::domain::recording_session::SealedRecording;
use crate::swap::domain::engine_config::EngineConfig;
use crate::swap::domain::face::Face;
use crate::swap::domain::face_engine::FaceEngine;
use crate::video::domain::video_writer::VideoWriter;

/// Messages sent from the swap thread to its owner.
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    Progress(SwapProgress),
    Complete(SwapReport),
    Error(String),
    Cancelled,
}

/// Everything a background swap pass needs. The recording is a sealed
/// snapshot, so later recordings cannot change it mid-pass.
pub struct SwapJob {
    pub engine: Box<dyn FaceEngine>,
    pub writer: Box<dyn VideoWriter>,
    pub config: EngineConfig,
    pub source_face: Face,
    pub recording: SealedRecording,
    pub output_path: PathBuf,
}

/// Spawn a background swap worker. Returns the channel receiver and
/// cancellation token.
pub fn spawn(job: SwapJob) -> (Receiver<WorkerMessage>, Arc<AtomicBool>) {
    let (tx, rx) = crossbeam_channel::unbounded::<WorkerMessage>();
    let cancelled = Arc::new(AtomicBool::new(false));
    let cancelled_clone = cancelled.clone();

    thread::spawn(move || {
        let message = match run_swap(&tx, &cancelled_clone, job) {
            Ok(report) => WorkerMessage::Complete(report),
            Err(SwapError::Cancelled) => WorkerMessage::Cancelled,
            Err(_) if cancelled_clone.load(Ordering::Relaxed) => WorkerMessage::Cancelled,
            Err(e) => WorkerMessage::Error(e.to_string()),
        };
        let _ = tx.send(message);
    });

    (rx, cancelled)
}

fn run_swap(
    tx: &Sender<WorkerMessage>,
    cancelled: &Arc<AtomicBool>,
    job: SwapJob,
) -> Result<SwapReport, SwapError> {
    let tx_progress = tx.clone();
    let cancelled_progress = cancelled.clone();
    let progress: SwapProgressFn = Box::new(move |p: &SwapProgress| {
        let _ = tx_progress.send(WorkerMessage::Progress(*p));
        !cancelled_progress.load(Ordering::Relaxed)
    });

    let mut use_case = SwapRecordingUseCase::new(
        job.engine,
        job.writer,
        job.config,
        job.source_face,
        Some(progress),
        Some(cancelled.clone()),
    );
    use_case.execute(&job.recording, &job.output_path)
}
