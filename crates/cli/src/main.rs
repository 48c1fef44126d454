use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use clap::{Parser, Subcommand};

use swapcam_core::capture::domain::capture_source::CaptureSource;
use swapcam_core::capture::infrastructure::ffmpeg_camera_source::FfmpegCameraSource;
use swapcam_core::capture::infrastructure::video_file_source::VideoFileSource;
use swapcam_core::config::app_config::AppConfig;
use swapcam_core::pipeline::record_video_use_case::{RecordProgress, RecordProgressFn};
use swapcam_core::pipeline::retime_video_use_case::RetimeVideoUseCase;
use swapcam_core::pipeline::studio_session::StudioSession;
use swapcam_core::recording::domain::recorder_state::RecordingController;
use swapcam_core::shared::constants::RETIMED_PREFIX;
use swapcam_core::shared::output_paths;
use swapcam_core::swap::domain::face_engine::FaceEngine;
use swapcam_core::upload::domain::upload_service::UploadService;
use swapcam_core::upload::infrastructure::media_api_uploader::MediaApiUploader;
use swapcam_core::video::domain::video_writer::VideoWriter;
use swapcam_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use swapcam_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use swapcam_core::video::infrastructure::image_loader;

/// Fixed-duration camera recording, re-timing and upload.
#[derive(Parser)]
#[command(name = "swapcam")]
struct Cli {
    /// Settings file (defaults to the per-user config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record a clip of exactly fps * duration frames.
    Record {
        /// Camera device, e.g. /dev/video0.
        #[arg(long)]
        device: Option<String>,

        /// Replay this video file instead of opening a camera.
        #[arg(long, conflicts_with = "device")]
        source: Option<PathBuf>,

        /// Output frame rate.
        #[arg(long)]
        fps: Option<f64>,

        /// Output duration in seconds.
        #[arg(long)]
        duration: Option<f64>,

        /// Output file (default: timestamped file in the output directory).
        #[arg(long)]
        output: Option<PathBuf>,

        /// Save the first captured frame as a PNG.
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Upload the recording when done.
        #[arg(long)]
        upload: bool,
    },
    /// Re-time an existing video to a fixed frame rate and duration.
    Retime {
        /// Input video file.
        input: PathBuf,

        /// Output file (default: timestamped file in the output directory).
        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long)]
        fps: Option<f64>,

        #[arg(long)]
        duration: Option<f64>,
    },
    /// Upload a video to the media API.
    Upload {
        file: PathBuf,

        /// Label the upload as synthetic instead of authentic.
        #[arg(long)]
        synthetic: bool,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(),
    };

    match cli.command {
        Command::Record {
            device,
            source,
            fps,
            duration,
            output,
            snapshot,
            upload,
        } => {
            if let Some(device) = device {
                config.capture.device = device;
            }
            apply_timing(&mut config, fps, duration);
            config.validate()?;
            run_record(config, source.as_deref(), output, snapshot, upload)
        }
        Command::Retime {
            input,
            output,
            fps,
            duration,
        } => {
            apply_timing(&mut config, fps, duration);
            config.validate()?;
            run_retime(&config, &input, output)
        }
        Command::Upload { file, synthetic } => {
            let uploader = MediaApiUploader::from_config(&config.upload)?;
            if !uploader.upload(&file, synthetic) {
                return Err(format!("upload of {} failed", file.display()).into());
            }
            println!("Uploaded {}", file.display());
            Ok(())
        }
    }
}

fn apply_timing(config: &mut AppConfig, fps: Option<f64>, duration: Option<f64>) {
    if let Some(fps) = fps {
        config.recording.target_fps = fps;
    }
    if let Some(duration) = duration {
        config.recording.duration_secs = duration;
    }
}

fn run_record(
    config: AppConfig,
    source: Option<&Path>,
    output: Option<PathBuf>,
    snapshot: Option<PathBuf>,
    upload: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let uploader = MediaApiUploader::from_config(&config.upload)?;
    let mut studio = StudioSession::new(
        config,
        Box::new(no_face_engine),
        Box::new(|| Box::new(FfmpegWriter::new()) as Box<dyn VideoWriter>),
        Box::new(uploader),
    );

    let capture = open_source(studio.config(), source)?;
    let progress = progress_printer(snapshot, studio.controller());
    let outcome = studio.record(capture, output.as_deref(), Some(progress))?;
    eprintln!();
    println!(
        "{}: {} frames captured, {} written ({:?})",
        outcome.output_path.display(),
        outcome.recording.captured_count(),
        outcome.written_frames,
        outcome.stop_reason
    );

    if upload && !studio.upload_recorded() {
        return Err("upload failed".into());
    }
    Ok(())
}

fn open_source(
    config: &AppConfig,
    source: Option<&Path>,
) -> Result<Box<dyn CaptureSource>, Box<dyn std::error::Error>> {
    match source {
        Some(path) => Ok(Box::new(VideoFileSource::open(
            Box::new(FfmpegReader::new()),
            path,
        )?)),
        None => Ok(Box::new(FfmpegCameraSource::open(&config.camera_settings())?)),
    }
}

fn run_retime(
    config: &AppConfig,
    input: &Path,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = match output {
        Some(path) => path,
        None => output_paths::timestamped(&config.recording.output_dir, RETIMED_PREFIX)?,
    };

    let outcome = RetimeVideoUseCase::new(
        Box::new(FfmpegReader::new()),
        Box::new(FfmpegWriter::new()),
        config.output_spec()?,
    )
    .execute(input, &output)?;

    println!(
        "{}: {} frames at {:.2} fps -> {} frames",
        output.display(),
        outcome.source_frames,
        outcome.source_fps,
        outcome.written_frames
    );
    Ok(())
}

fn no_face_engine() -> Result<Box<dyn FaceEngine>, Box<dyn std::error::Error>> {
    Err("this build has no face engine".into())
}

/// True once a full line (Enter) arrives; false on end of input or error.
fn enter_pressed(mut input: impl BufRead) -> bool {
    let mut line = String::new();
    matches!(input.read_line(&mut line), Ok(n) if n > 0)
}

/// Started from the first progress report, so the controller is already
/// recording. An Enter typed earlier is still buffered on stdin.
fn spawn_stop_listener(controller: Arc<RecordingController>) {
    eprintln!("Recording... press Enter to stop early");
    thread::spawn(move || {
        if enter_pressed(std::io::stdin().lock()) {
            if let Err(e) = controller.request_stop() {
                log::debug!("Stop request ignored: {e}");
            }
        }
    });
}

fn progress_printer(
    snapshot: Option<PathBuf>,
    controller: Arc<RecordingController>,
) -> RecordProgressFn {
    let listening = AtomicBool::new(false);
    let saved = AtomicBool::new(snapshot.is_none());
    Box::new(move |p: &RecordProgress<'_>| {
        if !listening.swap(true, Ordering::Relaxed) {
            spawn_stop_listener(controller.clone());
        }
        if !saved.swap(true, Ordering::Relaxed) {
            if let Some(path) = &snapshot {
                save_snapshot(p, path);
            }
        }
        eprint!(
            "\r{} frames, {:.1}s elapsed, {:.1}s left",
            p.captured,
            p.elapsed.as_secs_f64(),
            p.remaining.as_secs_f64()
        );
        true
    })
}

fn save_snapshot(progress: &RecordProgress<'_>, path: &Path) {
    match image_loader::frame_to_rgb(progress.frame) {
        Some(image) => match image.save(path) {
            Ok(()) => log::info!("Snapshot saved to {}", path.display()),
            Err(e) => log::warn!("Cannot save snapshot {}: {e}", path.display()),
        },
        None => log::warn!("Frame cannot be saved as RGB"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_end_of_input_is_not_a_stop() {
        assert!(!enter_pressed(Cursor::new("")));
    }

    #[test]
    fn test_enter_is_a_stop() {
        assert!(enter_pressed(Cursor::new("\n")));
        assert!(enter_pressed(Cursor::new("q\n")));
        assert!(enter_pressed(Cursor::new("no newline before eof")));
    }
}
