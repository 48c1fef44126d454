pub mod ffmpeg_reader;
pub mod ffmpeg_writer;
pub mod image_loader;
