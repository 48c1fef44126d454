pub mod media_api_uploader;
