use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::app_config::UploadConfig;
use crate::shared::constants::{DEFAULT_MODEL_TYPE, DEFAULT_UPLOAD_NAME_PREFIX, VIDEO_CONTENT_TYPE};
use crate::upload::domain::upload_service::UploadService;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("no upload token configured")]
    MissingToken,
    #[error("cannot read {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{step} returned status {status}, expected {expected}")]
    UnexpectedStatus {
        step: &'static str,
        status: StatusCode,
        expected: StatusCode,
    },
    #[error("response has no uploadUrl")]
    MissingUploadUrl,
}

/// Body of the upload-slot request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub name: String,
    pub content_type: String,
    pub size: u64,
    pub model_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadSlot {
    upload_url: Option<String>,
}

/// Two-step uploader for the media review API.
///
/// 1. `POST endpoint` with a bearer token asks for an upload slot (`201`
///    with `uploadUrl`).
/// 2. `PUT uploadUrl` sends the file bytes (`200`).
pub struct MediaApiUploader {
    endpoint: String,
    token: Option<String>,
    model_type: String,
    name_prefix: String,
    client: reqwest::blocking::Client,
}

impl MediaApiUploader {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Result<Self, UploadError> {
        let endpoint = endpoint.into();
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| UploadError::Request {
                url: endpoint.clone(),
                source: e,
            })?;
        Ok(Self {
            endpoint,
            token,
            model_type: DEFAULT_MODEL_TYPE.to_string(),
            name_prefix: DEFAULT_UPLOAD_NAME_PREFIX.to_string(),
            client,
        })
    }

    pub fn from_config(config: &UploadConfig) -> Result<Self, UploadError> {
        Ok(Self::new(config.endpoint.clone(), config.token.clone())?
            .with_model_type(config.model_type.clone())
            .with_name_prefix(config.name_prefix.clone()))
    }

    pub fn with_model_type(mut self, model_type: impl Into<String>) -> Self {
        self.model_type = model_type.into();
        self
    }

    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Builds the slot request for `path`. The label carries the
    /// synthetic/authentic flag, since the API has no field for it.
    pub fn build_request(
        &self,
        path: &Path,
        is_synthetic: bool,
    ) -> Result<UploadRequest, UploadError> {
        let size = fs::metadata(path)
            .map_err(|e| UploadError::File {
                path: path.to_path_buf(),
                source: e,
            })?
            .len();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        let label = if is_synthetic { "synthetic" } else { "authentic" };

        Ok(UploadRequest {
            name: format!("{}_{label}_{stem}", self.name_prefix),
            content_type: VIDEO_CONTENT_TYPE.to_string(),
            size,
            model_type: self.model_type.clone(),
        })
    }

    /// Runs both steps, returning the typed failure.
    pub fn try_upload(&self, path: &Path, is_synthetic: bool) -> Result<(), UploadError> {
        let token = self.token.as_deref().ok_or(UploadError::MissingToken)?;
        let request = self.build_request(path, is_synthetic)?;

        let upload_url = self.request_slot(token, &request)?;
        log::debug!("Received upload slot for {}", request.name);

        let body = fs::read(path).map_err(|e| UploadError::File {
            path: path.to_path_buf(),
            source: e,
        })?;
        let response = self
            .client
            .put(&upload_url)
            .header(reqwest::header::CONTENT_TYPE, VIDEO_CONTENT_TYPE)
            .body(body)
            .send()
            .map_err(|e| UploadError::Request {
                url: upload_url.clone(),
                source: e,
            })?;
        expect_status("file upload", response.status(), StatusCode::OK)?;

        log::info!("Uploaded {} ({} bytes)", path.display(), request.size);
        Ok(())
    }

    fn request_slot(&self, token: &str, request: &UploadRequest) -> Result<String, UploadError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(request)
            .send()
            .map_err(|e| UploadError::Request {
                url: self.endpoint.clone(),
                source: e,
            })?;
        expect_status("upload slot request", response.status(), StatusCode::CREATED)?;

        let slot: UploadSlot = response.json().map_err(|e| UploadError::Request {
            url: self.endpoint.clone(),
            source: e,
        })?;
        parse_upload_url(slot)
    }
}

fn expect_status(
    step: &'static str,
    status: StatusCode,
    expected: StatusCode,
) -> Result<(), UploadError> {
    if status == expected {
        Ok(())
    } else {
        Err(UploadError::UnexpectedStatus {
            step,
            status,
            expected,
        })
    }
}

fn parse_upload_url(slot: UploadSlot) -> Result<String, UploadError> {
    slot.upload_url
        .filter(|url| !url.is_empty())
        .ok_or(UploadError::MissingUploadUrl)
}

impl UploadService for MediaApiUploader {
    fn upload(&self, path: &Path, is_synthetic: bool) -> bool {
        match self.try_upload(path, is_synthetic) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Upload of {} failed: {e}", path.display());
                false
            }
        }
    }
}
