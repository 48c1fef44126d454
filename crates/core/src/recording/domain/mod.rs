pub mod capture_pacer;
pub mod frame_rate_normalizer;
pub mod output_spec;
pub mod recorder_state;
pub mod recording_session;
