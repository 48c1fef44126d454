use std::io::{ErrorKind, Read};
use std::process::{Child, ChildStdout, Command, Stdio};

use crate::capture::domain::capture_source::{CaptureError, CaptureSource};
use crate::shared::frame::Frame;

/// Camera parameters handed to the ffmpeg CLI.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraSettings {
    /// Device path or name, e.g. `/dev/video0`, `0`, `Integrated Camera`.
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// ffmpeg input format; platform default when `None`.
    pub input_format: Option<String>,
    pub warmup_frames: usize,
}

/// Reads RGB24 frames from a camera by piping raw video out of the `ffmpeg`
/// binary.
///
/// Frames are scaled to `width`x`height` by ffmpeg, so every frame of one
/// session has the same size even if the device negotiates another mode.
pub struct FfmpegCameraSource {
    child: Child,
    stdout: ChildStdout,
    width: u32,
    height: u32,
    frame_bytes: usize,
    frame_count: usize,
}

impl FfmpegCameraSource {
    pub fn open(settings: &CameraSettings) -> Result<Self, CaptureError> {
        if settings.width == 0 || settings.height == 0 {
            return Err(CaptureError::Device(format!(
                "invalid capture size {}x{}",
                settings.width, settings.height
            )));
        }

        let args = camera_args(settings);
        log::info!("Opening camera {} via ffmpeg", settings.device);
        log::debug!("ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                CaptureError::Device(format!("failed to spawn ffmpeg (is it installed?): {e}"))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CaptureError::Device("ffmpeg stdout not available".into()))?;

        let mut source = Self {
            child,
            stdout,
            width: settings.width,
            height: settings.height,
            frame_bytes: settings.width as usize * settings.height as usize * 3,
            frame_count: 0,
        };

        for _ in 0..settings.warmup_frames {
            source.read_raw()?;
        }
        source.frame_count = 0;

        log::info!(
            "Camera ready: {}x{} @ {} fps requested",
            settings.width,
            settings.height,
            settings.fps
        );
        Ok(source)
    }

    fn read_raw(&mut self) -> Result<Vec<u8>, CaptureError> {
        let mut buf = vec![0u8; self.frame_bytes];
        match self.stdout.read_exact(&mut buf) {
            Ok(()) => Ok(buf),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                let frame_count = self.frame_count;
                log::warn!(
                    "Camera stream ended after {} frames: {}",
                    frame_count,
                    self.stderr_tail()
                );
                Err(CaptureError::Closed)
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => Err(CaptureError::Unavailable),
            Err(e) => Err(CaptureError::Device(format!("failed to read from ffmpeg: {e}"))),
        }
    }

    fn stderr_tail(&mut self) -> String {
        let mut text = String::new();
        if let Some(stderr) = self.child.stderr.as_mut() {
            let _ = stderr.read_to_string(&mut text);
        }
        text.trim().lines().last().unwrap_or_default().to_string()
    }
}

impl CaptureSource for FfmpegCameraSource {
    fn read(&mut self) -> Result<Frame, CaptureError> {
        let data = self.read_raw()?;
        let frame = Frame::new(data, self.width, self.height, 3, self.frame_count);
        self.frame_count += 1;
        Ok(frame)
    }
}

impl Drop for FfmpegCameraSource {
    fn drop(&mut self) {
        log::debug!("Closing camera after {} frames", self.frame_count);
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn default_input_format() -> &'static str {
    if cfg!(target_os = "macos") {
        "avfoundation"
    } else if cfg!(target_os = "windows") {
        "dshow"
    } else {
        "v4l2"
    }
}

fn input_name(format: &str, device: &str) -> String {
    if format == "dshow" && !device.starts_with("video=") {
        format!("video={device}")
    } else {
        device.to_string()
    }
}

/// Builds the ffmpeg argument list for a camera capture.
pub fn camera_args(settings: &CameraSettings) -> Vec<String> {
    let format = settings
        .input_format
        .as_deref()
        .unwrap_or(default_input_format());
    let size = format!("{}x{}", settings.width, settings.height);

    let mut args: Vec<String> = vec!["-hide_banner".into(), "-loglevel".into(), "error".into()];
    args.extend(["-f".into(), format.to_string()]);
    if settings.fps > 0.0 {
        args.extend(["-framerate".into(), format!("{}", settings.fps)]);
    }
    args.extend(["-video_size".into(), size]);
    args.extend(["-i".into(), input_name(format, &settings.device)]);
    args.extend([
        "-vf".into(),
        format!("scale={}:{}", settings.width, settings.height),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "rgb24".into(),
        "pipe:1".into(),
    ]);
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(format: Option<&str>, device: &str) -> CameraSettings {
        CameraSettings {
            device: device.to_string(),
            width: 640,
            height: 480,
            fps: 30.0,
            input_format: format.map(str::to_string),
            warmup_frames: 5,
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_v4l2_args() {
        let args = camera_args(&settings(Some("v4l2"), "/dev/video0"));
        assert_eq!(value_after(&args, "-f"), Some("v4l2"));
        assert_eq!(value_after(&args, "-i"), Some("/dev/video0"));
        assert_eq!(value_after(&args, "-video_size"), Some("640x480"));
        assert_eq!(value_after(&args, "-framerate"), Some("30"));
        assert_eq!(value_after(&args, "-pix_fmt"), Some("rgb24"));
        assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
    }

    #[test]
    fn test_dshow_prefixes_device_name() {
        let args = camera_args(&settings(Some("dshow"), "Integrated Camera"));
        assert_eq!(value_after(&args, "-i"), Some("video=Integrated Camera"));

        let args = camera_args(&settings(Some("dshow"), "video=USB Cam"));
        assert_eq!(value_after(&args, "-i"), Some("video=USB Cam"));
    }

    #[test]
    fn test_output_is_scaled_to_requested_size() {
        let args = camera_args(&settings(Some("avfoundation"), "0"));
        assert_eq!(value_after(&args, "-vf"), Some("scale=640:480"));
    }

    #[test]
    fn test_zero_fps_omits_framerate() {
        let mut s = settings(Some("v4l2"), "/dev/video0");
        s.fps = 0.0;
        let args = camera_args(&s);
        assert!(!args.iter().any(|a| a == "-framerate"));
    }

    #[test]
    fn test_default_format_is_platform_specific() {
        let args = camera_args(&settings(None, "0"));
        assert_eq!(value_after(&args, "-f"), Some(default_input_format()));
    }

    #[test]
    fn test_open_rejects_zero_size() {
        let mut s = settings(Some("v4l2"), "/dev/video0");
        s.width = 0;
        assert!(matches!(
            FfmpegCameraSource::open(&s),
            Err(CaptureError::Device(_))
        ));
    }
}
