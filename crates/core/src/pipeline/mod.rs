pub mod infrastructure;
pub mod load_source_face_use_case;
pub mod normalized_export;
pub mod record_video_use_case;
pub mod retime_video_use_case;
pub mod studio_session;
pub mod swap_recording_use_case;
