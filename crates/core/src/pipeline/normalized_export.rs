use std::path::Path;

use crate::recording::domain::output_spec::OutputSpec;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::VideoWriter;

/// Writes `frames[indices[0]], frames[indices[1]], ...` at `spec.fps()`.
///
/// The writer is closed even when a write fails, so a partial file is
/// still finalized. Returns the number of frames written.
pub fn write_sequence(
    writer: &mut dyn VideoWriter,
    output_path: &Path,
    spec: &OutputSpec,
    frames: &[Frame],
    indices: &[usize],
) -> Result<usize, Box<dyn std::error::Error>> {
    let first = frames.first().ok_or("No frames to write")?;
    let (width, height) = first.dimensions();
    let metadata = VideoMetadata::for_output(width, height, spec.fps(), indices.len());

    writer.open(output_path, &metadata)?;

    let written = indices
        .iter()
        .try_for_each(|&i| -> Result<(), Box<dyn std::error::Error>> {
            let frame = frames
                .get(i)
                .ok_or_else(|| format!("Source index {i} out of range ({} frames)", frames.len()))?;
            writer.write(frame)
        });
    let closed = writer.close();

    written?;
    closed?;

    log::debug!(
        "Wrote {} frames from {} sources to {}",
        indices.len(),
        frames.len(),
        output_path.display()
    );
    Ok(indices.len())
}
