use serde::{Deserialize, Serialize};

/// How target faces are picked from a frame's detections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceSelectorMode {
    /// The first face after ordering.
    One,
    /// Every detected face.
    Many,
    /// Faces whose embedding is close to the reference face.
    Reference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaceSelectorOrder {
    LeftRight,
    RightLeft,
    TopBottom,
    BottomTop,
    SmallLarge,
    LargeSmall,
    BestWorst,
    WorstBest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoMemoryStrategy {
    Strict,
    Moderate,
    Tolerant,
}

/// Global configuration pushed into the face engine before first use.
///
/// Field values are opaque to this crate apart from the selector settings;
/// model names, mask settings and providers are interpreted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub download_providers: Vec<String>,
    pub execution_providers: Vec<String>,
    pub execution_device_ids: Vec<String>,
    pub execution_thread_count: u32,

    pub face_detector_model: String,
    pub face_detector_angles: Vec<i32>,
    pub face_detector_size: String,
    pub face_detector_score: f32,
    pub face_landmarker_model: String,
    pub face_landmarker_score: f32,

    pub face_selector_mode: FaceSelectorMode,
    pub face_selector_order: FaceSelectorOrder,
    pub reference_face_position: usize,
    pub reference_face_distance: f32,
    pub reference_frame_number: usize,

    pub face_occluder_model: String,
    pub face_parser_model: String,
    pub face_mask_types: Vec<String>,
    pub face_mask_regions: Vec<String>,
    pub face_mask_blur: f32,
    /// Top, right, bottom, left, in percent of the face box.
    pub face_mask_padding: [u32; 4],

    pub face_swapper_model: String,
    pub face_swapper_pixel_boost: String,
    pub face_swapper_weight: f32,
    pub video_memory_strategy: VideoMemoryStrategy,
    pub system_memory_limit: u32,

    pub output_image_quality: u32,
    pub output_image_scale: f32,
    pub output_video_scale: f32,
}

const MASK_REGIONS: &[&str] = &[
    "skin",
    "left-eyebrow",
    "right-eyebrow",
    "left-eye",
    "right-eye",
    "nose",
    "mouth",
    "upper-lip",
    "lower-lip",
];

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            download_providers: strings(&["huggingface", "github"]),
            execution_providers: strings(&["cpu"]),
            execution_device_ids: strings(&["0"]),
            execution_thread_count: 1,

            face_detector_model: "yolo_face".into(),
            face_detector_angles: vec![0],
            face_detector_size: "640x640".into(),
            face_detector_score: 0.5,
            face_landmarker_model: "2dfan4".into(),
            face_landmarker_score: 0.5,

            face_selector_mode: FaceSelectorMode::Reference,
            face_selector_order: FaceSelectorOrder::LargeSmall,
            reference_face_position: 0,
            reference_face_distance: 0.3,
            reference_frame_number: 0,

            face_occluder_model: "xseg_1".into(),
            face_parser_model: "bisenet_resnet_34".into(),
            face_mask_types: strings(&["box"]),
            face_mask_regions: strings(MASK_REGIONS),
            face_mask_blur: 0.3,
            face_mask_padding: [0, 0, 0, 0],

            face_swapper_model: "inswapper_128".into(),
            face_swapper_pixel_boost: "128x128".into(),
            face_swapper_weight: 0.5,
            video_memory_strategy: VideoMemoryStrategy::Moderate,
            system_memory_limit: 0,

            output_image_quality: 80,
            output_image_scale: 1.0,
            output_video_scale: 1.0,
        }
    }
}

impl EngineConfig {
    /// Checks ranges the engine would otherwise reject at run time.
    pub fn validate(&self) -> Result<(), String> {
        if self.execution_providers.is_empty() {
            return Err("at least one execution provider is required".into());
        }
        if !(0.0..=1.0).contains(&self.face_detector_score) {
            return Err(format!(
                "face_detector_score must be between 0.0 and 1.0, got {}",
                self.face_detector_score
            ));
        }
        if !(0.0..=1.0).contains(&self.face_landmarker_score) {
            return Err(format!(
                "face_landmarker_score must be between 0.0 and 1.0, got {}",
                self.face_landmarker_score
            ));
        }
        if !(0.0..=2.0).contains(&self.reference_face_distance) {
            return Err(format!(
                "reference_face_distance must be between 0.0 and 2.0, got {}",
                self.reference_face_distance
            ));
        }
        if !(0.0..=1.0).contains(&self.face_mask_blur) {
            return Err(format!(
                "face_mask_blur must be between 0.0 and 1.0, got {}",
                self.face_mask_blur
            ));
        }
        if self.face_mask_padding.iter().any(|&p| p > 100) {
            return Err("face_mask_padding values must be percentages (0-100)".into());
        }
        if !(0.0..=1.0).contains(&self.face_swapper_weight) {
            return Err(format!(
                "face_swapper_weight must be between 0.0 and 1.0, got {}",
                self.face_swapper_weight
            ));
        }
        if self.output_image_quality > 100 {
            return Err(format!(
                "output_image_quality must be at most 100, got {}",
                self.output_image_quality
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_value(EngineConfig::default()).unwrap();
        assert_eq!(json["face_selector_order"], "large-small");
        assert_eq!(json["face_selector_mode"], "reference");
        assert_eq!(json["video_memory_strategy"], "moderate");
        assert_eq!(json["face_mask_regions"].as_array().unwrap().len(), 9);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"face_selector_mode": "many", "face_swapper_weight": 0.8}"#)
                .unwrap();
        assert_eq!(config.face_selector_mode, FaceSelectorMode::Many);
        assert_eq!(config.face_swapper_weight, 0.8);
        assert_eq!(config.face_swapper_model, "inswapper_128");
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = EngineConfig::default();
        config.face_detector_score = 1.5;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.execution_providers.clear();
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.face_mask_padding = [0, 120, 0, 0];
        assert!(config.validate().is_err());
    }
}
