use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::swap::domain::engine_config::{EngineConfig, FaceSelectorMode, FaceSelectorOrder};
use crate::swap::domain::face::Face;
use crate::swap::domain::face_engine::FaceEngine;
use crate::swap::domain::face_selector::FaceSelector;

#[derive(Error, Debug)]
pub enum SourceFaceError {
    #[error("invalid engine configuration: {0}")]
    Config(String),
    #[error("face engine failed: {0}")]
    Engine(String),
    #[error("cannot load image {path}: {message}")]
    Image { path: PathBuf, message: String },
    #[error("no face found in {0}")]
    NoFaceFound(PathBuf),
}

pub type ImageLoaderFn = fn(&Path) -> Result<Frame, Box<dyn std::error::Error>>;

/// Extracts the face to paste into recordings from a still image.
///
/// The engine is configured on the first call only. When the image holds
/// several faces the largest one wins.
pub struct LoadSourceFaceUseCase {
    engine: Box<dyn FaceEngine>,
    config: EngineConfig,
    load_image: ImageLoaderFn,
    configured: bool,
}

impl LoadSourceFaceUseCase {
    pub fn new(
        engine: Box<dyn FaceEngine>,
        config: EngineConfig,
        load_image: ImageLoaderFn,
    ) -> Self {
        Self {
            engine,
            config,
            load_image,
            configured: false,
        }
    }

    pub fn execute(&mut self, image_path: &Path) -> Result<Face, SourceFaceError> {
        self.ensure_configured()?;

        let image = (self.load_image)(image_path).map_err(|e| SourceFaceError::Image {
            path: image_path.to_path_buf(),
            message: e.to_string(),
        })?;
        let faces = self
            .engine
            .detect(&image)
            .map_err(|e| SourceFaceError::Engine(e.to_string()))?;
        log::debug!("{} faces in {}", faces.len(), image_path.display());

        let selector = FaceSelector::new(
            FaceSelectorMode::One,
            FaceSelectorOrder::LargeSmall,
            self.config.reference_face_distance,
        );
        selector
            .select(faces, None)
            .into_iter()
            .next()
            .ok_or_else(|| SourceFaceError::NoFaceFound(image_path.to_path_buf()))
    }

    fn ensure_configured(&mut self) -> Result<(), SourceFaceError> {
        if self.configured {
            return Ok(());
        }
        self.config.validate().map_err(SourceFaceError::Config)?;
        self.engine
            .configure(&self.config)
            .map_err(|e| SourceFaceError::Engine(e.to_string()))?;
        self.configured = true;
        log::info!(
            "Face engine configured ({}, {})",
            self.config.face_swapper_model,
            self.config.execution_providers.join(",")
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::swap_recording_use_case::test_support::StubEngine;

    fn blank_image(path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
        if path.to_string_lossy().contains("missing") {
            return Err("file not found".into());
        }
        let tag = if path.to_string_lossy().contains("odd") { 1 } else { 0 };
        Ok(Frame::new(vec![tag; 12], 2, 2, 3, 0))
    }

    #[test]
    fn test_configures_once_across_calls() {
        let engine = StubEngine::default();
        let mut uc = LoadSourceFaceUseCase::new(
            Box::new(engine.clone()),
            EngineConfig::default(),
            blank_image,
        );

        assert!(uc.execute(Path::new("a.png")).is_ok());
        assert!(uc.execute(Path::new("b.png")).is_ok());
        assert_eq!(*engine.configured.lock().unwrap(), 1);
    }

    #[test]
    fn test_no_face_is_reported() {
        let mut uc = LoadSourceFaceUseCase::new(
            Box::new(StubEngine::default()),
            EngineConfig::default(),
            blank_image,
        );
        let err = uc.execute(Path::new("odd.png")).unwrap_err();
        assert!(matches!(err, SourceFaceError::NoFaceFound(_)));
    }

    #[test]
    fn test_unreadable_image_is_reported() {
        let mut uc = LoadSourceFaceUseCase::new(
            Box::new(StubEngine::default()),
            EngineConfig::default(),
            blank_image,
        );
        let err = uc.execute(Path::new("missing.png")).unwrap_err();
        assert!(matches!(err, SourceFaceError::Image { .. }));
    }

    #[test]
    fn test_invalid_config_never_reaches_engine() {
        let engine = StubEngine::default();
        let mut config = EngineConfig::default();
        config.face_detector_score = 3.0;
        let mut uc = LoadSourceFaceUseCase::new(Box::new(engine.clone()), config, blank_image);

        assert!(matches!(
            uc.execute(Path::new("a.png")),
            Err(SourceFaceError::Config(_))
        ));
        assert_eq!(*engine.configured.lock().unwrap(), 0);
    }

    #[test]
    fn test_configure_failure_leaves_engine_unconfigured() {
        let engine = StubEngine {
            fail_configure: true,
            ..Default::default()
        };
        let mut uc =
            LoadSourceFaceUseCase::new(Box::new(engine), EngineConfig::default(), blank_image);
        assert!(matches!(
            uc.execute(Path::new("a.png")),
            Err(SourceFaceError::Engine(_))
        ));
        assert!(!uc.configured);
    }
}
