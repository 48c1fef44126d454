use crate::shared::frame::Frame;
use crate::swap::domain::engine_config::EngineConfig;
use crate::swap::domain::face::Face;

/// Domain interface for the external face-analysis and swapping library.
///
/// `configure` is called once before the first `detect`/`swap`. `swap`
/// returns `None` when the engine declines to change the frame.
pub trait FaceEngine: Send {
    fn configure(&mut self, config: &EngineConfig) -> Result<(), Box<dyn std::error::Error>>;

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Face>, Box<dyn std::error::Error>>;

    fn swap(
        &mut self,
        source: &Face,
        target: &Face,
        frame: &Frame,
    ) -> Result<Option<Frame>, Box<dyn std::error::Error>>;
}
