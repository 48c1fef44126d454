use std::cmp::Ordering;

use crate::swap::domain::engine_config::{EngineConfig, FaceSelectorMode, FaceSelectorOrder};
use crate::swap::domain::face::Face;

/// Picks which detected faces in a frame get swapped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceSelector {
    mode: FaceSelectorMode,
    order: FaceSelectorOrder,
    reference_distance: f32,
}

impl FaceSelector {
    pub fn new(mode: FaceSelectorMode, order: FaceSelectorOrder, reference_distance: f32) -> Self {
        Self {
            mode,
            order,
            reference_distance,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.face_selector_mode,
            config.face_selector_order,
            config.reference_face_distance,
        )
    }

    pub fn mode(&self) -> FaceSelectorMode {
        self.mode
    }

    /// Sorts faces by the configured order. The sort is stable, so ties
    /// keep detector order.
    pub fn order(&self, mut faces: Vec<Face>) -> Vec<Face> {
        faces.sort_by(|a, b| compare(self.order, a, b));
        faces
    }

    /// Returns the swap targets for one frame.
    ///
    /// In reference mode without a reference face this degrades to `One`.
    pub fn select(&self, faces: Vec<Face>, reference: Option<&Face>) -> Vec<Face> {
        let ordered = self.order(faces);
        match (self.mode, reference) {
            (FaceSelectorMode::Many, _) => ordered,
            (FaceSelectorMode::Reference, Some(reference)) => ordered
                .into_iter()
                .filter(|f| f.distance_to(reference) <= self.reference_distance)
                .collect(),
            (FaceSelectorMode::One, _) | (FaceSelectorMode::Reference, None) => {
                ordered.into_iter().take(1).collect()
            }
        }
    }

    /// The face at `position` after ordering, clamped to the last face.
    pub fn pick_reference(&self, faces: Vec<Face>, position: usize) -> Option<Face> {
        let mut ordered = self.order(faces);
        if ordered.is_empty() {
            return None;
        }
        let position = position.min(ordered.len() - 1);
        Some(ordered.swap_remove(position))
    }
}

fn compare(order: FaceSelectorOrder, a: &Face, b: &Face) -> Ordering {
    match order {
        FaceSelectorOrder::LeftRight => a.bbox.x.total_cmp(&b.bbox.x),
        FaceSelectorOrder::RightLeft => b.bbox.x.total_cmp(&a.bbox.x),
        FaceSelectorOrder::TopBottom => a.bbox.y.total_cmp(&b.bbox.y),
        FaceSelectorOrder::BottomTop => b.bbox.y.total_cmp(&a.bbox.y),
        FaceSelectorOrder::SmallLarge => a.area().total_cmp(&b.area()),
        FaceSelectorOrder::LargeSmall => b.area().total_cmp(&a.area()),
        FaceSelectorOrder::BestWorst => b.score.total_cmp(&a.score),
        FaceSelectorOrder::WorstBest => a.score.total_cmp(&b.score),
    }
}
