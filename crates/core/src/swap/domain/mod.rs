pub mod engine_config;
pub mod face;
pub mod face_engine;
pub mod face_selector;
pub mod swap_outcome;
