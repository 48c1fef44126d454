use std::path::Path;

use image::RgbImage;

use crate::shared::frame::Frame;

/// Decodes an image file (PNG, JPEG, ...) into an RGB [`Frame`] with index 0.
pub fn load_image_frame(path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
    let image = image::open(path)
        .map_err(|e| format!("Failed to open image {}: {e}", path.display()))?
        .to_rgb8();
    Ok(frame_from_rgb(image, 0))
}

pub fn frame_from_rgb(image: RgbImage, index: usize) -> Frame {
    let (width, height) = image.dimensions();
    Frame::new(image.into_raw(), width, height, 3, index)
}

/// Converts a 3-channel frame back to an `RgbImage`, e.g. for saving a preview.
pub fn frame_to_rgb(frame: &Frame) -> Option<RgbImage> {
    if frame.channels() != 3 {
        return None;
    }
    RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
}
