pub const DEFAULT_TARGET_FPS: f64 = 30.0;
pub const DEFAULT_DURATION_SECS: f64 = 10.0;

/// Upper bound on frames in one output file or one loaded recording
/// (20 minutes at 30 fps). Every frame is held in memory as RGB24.
pub const MAX_OUTPUT_FRAMES: usize = 36_000;

pub const DEFAULT_CAPTURE_WIDTH: u32 = 640;
pub const DEFAULT_CAPTURE_HEIGHT: u32 = 480;

pub const MIN_CAPTURE_FPS: f64 = 0.1;
pub const MAX_CAPTURE_FPS: f64 = 1000.0;

/// Frames read and thrown away after the camera opens; the first few are
/// often dark or partially exposed.
pub const DEFAULT_WARMUP_FRAMES: usize = 5;

/// Consecutive transient read failures tolerated before a recording aborts
/// (~1 second at 30 fps).
pub const DEFAULT_MAX_READ_FAILURES: usize = 30;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

pub const DEFAULT_OUTPUT_DIR: &str = "temp_data";
pub const RECORDED_PREFIX: &str = "recorded";
pub const FACESWAP_PREFIX: &str = "faceswap";
pub const RETIMED_PREFIX: &str = "retimed";
pub const VIDEO_EXTENSION: &str = "mp4";

pub const MEDIA_API_URL: &str = "https://platform.authenta.ai/api/media";
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";
pub const DEFAULT_MODEL_TYPE: &str = "DF-1";
pub const DEFAULT_UPLOAD_NAME_PREFIX: &str = "swapcam";
pub const UPLOAD_TOKEN_ENV: &str = "SWAPCAM_UPLOAD_TOKEN";
