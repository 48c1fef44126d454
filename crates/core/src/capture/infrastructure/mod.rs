pub mod channel_capture_source;
pub mod ffmpeg_camera_source;
pub mod video_file_source;
