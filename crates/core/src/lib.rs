pub mod capture;
pub mod config;
pub mod pipeline;
pub mod recording;
pub mod shared;
pub mod swap;
pub mod upload;
pub mod video;
