pub mod constants;
pub mod frame;
pub mod output_paths;
pub mod video_metadata;
