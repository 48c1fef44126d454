use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::infrastructure::ffmpeg_camera_source::CameraSettings;
use crate::recording::domain::output_spec::{OutputSpec, OutputSpecError};
use crate::shared::constants::{
    DEFAULT_CAPTURE_HEIGHT, DEFAULT_CAPTURE_WIDTH, DEFAULT_DURATION_SECS,
    DEFAULT_MAX_READ_FAILURES, DEFAULT_MODEL_TYPE, DEFAULT_OUTPUT_DIR, DEFAULT_READ_TIMEOUT_MS,
    DEFAULT_TARGET_FPS, DEFAULT_UPLOAD_NAME_PREFIX, DEFAULT_WARMUP_FRAMES, MAX_CAPTURE_FPS,
    MEDIA_API_URL, MIN_CAPTURE_FPS, UPLOAD_TOKEN_ENV,
};
use crate::swap::domain::engine_config::EngineConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid capture settings: {0}")]
    Capture(String),
    #[error(transparent)]
    Output(#[from] OutputSpecError),
    #[error("invalid engine settings: {0}")]
    Engine(String),
    #[error("could not determine config directory")]
    NoConfigDir,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub input_format: Option<String>,
    pub warmup_frames: usize,
    pub max_consecutive_read_failures: usize,
    pub read_timeout_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: default_device().to_string(),
            width: DEFAULT_CAPTURE_WIDTH,
            height: DEFAULT_CAPTURE_HEIGHT,
            fps: DEFAULT_TARGET_FPS,
            input_format: None,
            warmup_frames: DEFAULT_WARMUP_FRAMES,
            max_consecutive_read_failures: DEFAULT_MAX_READ_FAILURES,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

fn default_device() -> &'static str {
    if cfg!(target_os = "linux") {
        "/dev/video0"
    } else if cfg!(target_os = "windows") {
        "Integrated Camera"
    } else {
        "0"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub target_fps: f64,
    pub duration_secs: f64,
    pub output_dir: PathBuf,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            target_fps: DEFAULT_TARGET_FPS,
            duration_secs: DEFAULT_DURATION_SECS,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub endpoint: String,
    pub token: Option<String>,
    pub model_type: String,
    pub name_prefix: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: MEDIA_API_URL.to_string(),
            token: None,
            model_type: DEFAULT_MODEL_TYPE.to_string(),
            name_prefix: DEFAULT_UPLOAD_NAME_PREFIX.to_string(),
        }
    }
}

/// Application settings persisted as JSON.
///
/// Every field has a default, so a partial file only overrides what it
/// names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub capture: CaptureConfig,
    pub recording: RecordingConfig,
    pub engine: EngineConfig,
    pub upload: UploadConfig,
}

impl AppConfig {
    /// `<config dir>/SwapCam/settings.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("SwapCam").join("settings.json"))
    }

    /// Loads from the default location. A missing or unreadable file
    /// yields defaults.
    pub fn load() -> Self {
        let config = Self::default_path()
            .and_then(|path| fs::read_to_string(path).ok())
            .and_then(|json| serde_json::from_str::<AppConfig>(&json).ok())
            .unwrap_or_default();
        config.with_env_overrides()
    }

    /// Loads an explicitly named file; errors are reported.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(config.with_env_overrides())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::write(path, json).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(token) = std::env::var(UPLOAD_TOKEN_ENV) {
            if !token.is_empty() {
                self.upload.token = Some(token);
            }
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let capture = &self.capture;
        if capture.width == 0 || capture.height == 0 {
            return Err(ConfigError::Capture(format!(
                "frame size must be non-zero, got {}x{}",
                capture.width, capture.height
            )));
        }
        if !(MIN_CAPTURE_FPS..=MAX_CAPTURE_FPS).contains(&capture.fps) {
            return Err(ConfigError::Capture(format!(
                "capture fps must be between {MIN_CAPTURE_FPS} and {MAX_CAPTURE_FPS}, got {}",
                capture.fps
            )));
        }
        if capture.device.is_empty() {
            return Err(ConfigError::Capture("device must not be empty".into()));
        }
        self.output_spec()?;
        self.engine.validate().map_err(ConfigError::Engine)
    }

    pub fn output_spec(&self) -> Result<OutputSpec, OutputSpecError> {
        OutputSpec::new(self.recording.target_fps, self.recording.duration_secs)
    }

    pub fn camera_settings(&self) -> CameraSettings {
        CameraSettings {
            device: self.capture.device.clone(),
            width: self.capture.width,
            height: self.capture.height,
            fps: self.capture.fps,
            input_format: self.capture.input_format.clone(),
            warmup_frames: self.capture.warmup_frames,
        }
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.capture.read_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_relative_eq!(config.recording.target_fps, 30.0);
        assert_relative_eq!(config.recording.duration_secs, 10.0);
        assert_eq!(config.recording.output_dir, PathBuf::from("temp_data"));
        assert_eq!(config.capture.warmup_frames, 5);
        assert_eq!(config.upload.endpoint, MEDIA_API_URL);
        assert_eq!(config.upload.model_type, "DF-1");
        assert!(config.validate().is_ok());
        assert_eq!(config.output_spec().unwrap().frame_count().get(), 300);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"recording": {"target_fps": 10}, "capture": {"device": "/dev/video2"}}"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_relative_eq!(config.recording.target_fps, 10.0);
        assert_relative_eq!(config.recording.duration_secs, 10.0);
        assert_eq!(config.capture.device, "/dev/video2");
        assert_eq!(config.capture.width, 640);
        assert_eq!(config.output_spec().unwrap().frame_count().get(), 100);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut config = AppConfig::default();
        config.recording.duration_secs = 4.0;
        config.capture.input_format = Some("mjpeg".into());

        config.save_to(&path).unwrap();
        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.recording, config.recording);
        assert_eq!(loaded.capture, config.capture);
        assert_eq!(loaded.engine, config.engine);
    }

    #[test]
    fn test_load_from_missing_file_is_error() {
        let err = AppConfig::load_from(Path::new("/nonexistent/settings.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_from_invalid_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.recording.target_fps = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Output(_))));

        let mut config = AppConfig::default();
        config.capture.width = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Capture(_))));

        let mut config = AppConfig::default();
        config.engine.face_swapper_weight = 2.0;
        assert!(matches!(config.validate(), Err(ConfigError::Engine(_))));
    }

    #[rstest]
    #[case(1e-30)]
    #[case(0.05)]
    #[case(1000.5)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_validate_rejects_capture_fps_out_of_range(#[case] fps: f64) {
        let mut config = AppConfig::default();
        config.capture.fps = fps;
        assert!(matches!(config.validate(), Err(ConfigError::Capture(_))));
    }

    #[test]
    fn test_validate_rejects_oversized_recording() {
        let mut config = AppConfig::default();
        config.recording.duration_secs = 1e20;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Output(OutputSpecError::TooManyFrames { .. }))
        ));
    }

    #[test]
    fn test_camera_settings_follow_capture_config() {
        let mut config = AppConfig::default();
        config.capture.device = "/dev/video4".into();
        config.capture.fps = 15.0;
        let settings = config.camera_settings();
        assert_eq!(settings.device, "/dev/video4");
        assert_relative_eq!(settings.fps, 15.0);
        assert_eq!(settings.warmup_frames, 5);
        assert_eq!(config.read_timeout(), Duration::from_millis(1000));
    }
}
