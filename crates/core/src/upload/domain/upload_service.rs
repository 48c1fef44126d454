use std::path::Path;

/// Domain interface for handing a finished video to the review service.
///
/// Failures are absorbed by the implementation and reported as `false`;
/// callers only need to know whether the file made it.
pub trait UploadService: Send {
    fn upload(&self, path: &Path, is_synthetic: bool) -> bool;
}
