use crate::shared::frame::Frame;
use crate::swap::domain::face::Face;
use crate::swap::domain::face_engine::FaceEngine;
use crate::swap::domain::face_selector::FaceSelector;

/// Result of processing a single frame.
#[derive(Clone, Debug, PartialEq)]
pub enum SwapOutcome {
    Swapped(Frame),
    Unchanged(Frame),
}

impl SwapOutcome {
    pub fn is_swapped(&self) -> bool {
        matches!(self, SwapOutcome::Swapped(_))
    }

    pub fn frame(&self) -> &Frame {
        match self {
            SwapOutcome::Swapped(f) | SwapOutcome::Unchanged(f) => f,
        }
    }

    pub fn into_frame(self) -> Frame {
        match self {
            SwapOutcome::Swapped(f) | SwapOutcome::Unchanged(f) => f,
        }
    }
}

/// Applies the source face to every selected target in a frame.
///
/// Engine failures never abort a pass: they are logged and the frame
/// passes through unchanged.
pub struct FrameSwapper {
    source: Face,
    selector: FaceSelector,
    reference: Option<Face>,
}

impl FrameSwapper {
    pub fn new(source: Face, selector: FaceSelector) -> Self {
        Self {
            source,
            selector,
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: Option<Face>) -> Self {
        self.reference = reference;
        self
    }

    pub fn apply(&self, engine: &mut dyn FaceEngine, frame: &Frame) -> SwapOutcome {
        let faces = match engine.detect(frame) {
            Ok(faces) => faces,
            Err(e) => {
                log::warn!("Face detection failed on frame {}: {e}", frame.index());
                return SwapOutcome::Unchanged(frame.clone());
            }
        };

        let targets = self.selector.select(faces, self.reference.as_ref());
        if targets.is_empty() {
            log::debug!("No target face in frame {}", frame.index());
            return SwapOutcome::Unchanged(frame.clone());
        }

        let mut current: Option<Frame> = None;
        for target in &targets {
            let input = current.as_ref().unwrap_or(frame);
            match engine.swap(&self.source, target, input) {
                Ok(Some(swapped)) => current = Some(swapped.with_index(frame.index())),
                Ok(None) => {
                    log::debug!("Engine left frame {} unchanged", frame.index());
                }
                Err(e) => {
                    log::warn!("Face swap failed on frame {}: {e}", frame.index());
                }
            }
        }

        match current {
            Some(swapped) => SwapOutcome::Swapped(swapped),
            None => SwapOutcome::Unchanged(frame.clone()),
        }
    }
}
