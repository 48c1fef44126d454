pub mod upload_service;
