use std::path::Path;
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;

use crate::capture::domain::capture_source::{CaptureError, CaptureSource};
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

type SendError = String;

/// Replays a video file as a capture source.
///
/// Decoding runs on a dedicated thread that feeds a bounded channel, the
/// same reader-thread layout the swap and export passes use. End of file is
/// reported as [`CaptureError::Closed`].
pub struct VideoFileSource {
    metadata: VideoMetadata,
    frame_rx: Option<Receiver<Result<Frame, SendError>>>,
    reader_handle: Option<JoinHandle<()>>,
}

impl VideoFileSource {
    pub fn open(
        mut reader: Box<dyn VideoReader>,
        path: &Path,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let metadata = reader.open(path)?;
        let (frame_tx, frame_rx) = crossbeam_channel::bounded(DEFAULT_CHANNEL_CAPACITY);

        let reader_handle = std::thread::spawn(move || {
            for frame_result in reader.frames() {
                let mapped = frame_result.map_err(|e| e.to_string());
                if frame_tx.send(mapped).is_err() {
                    break;
                }
            }
            reader.close();
        });

        Ok(Self {
            metadata,
            frame_rx: Some(frame_rx),
            reader_handle: Some(reader_handle),
        })
    }

    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }
}

impl CaptureSource for VideoFileSource {
    fn read(&mut self) -> Result<Frame, CaptureError> {
        let rx = self.frame_rx.as_ref().ok_or(CaptureError::Closed)?;
        match rx.recv() {
            Ok(Ok(frame)) => Ok(frame),
            Ok(Err(e)) => Err(CaptureError::Device(e)),
            Err(_) => Err(CaptureError::Closed),
        }
    }
}

impl Drop for VideoFileSource {
    fn drop(&mut self) {
        // Dropping the receiver unblocks a reader stuck on a full channel.
        self.frame_rx = None;
        if let Some(handle) = self.reader_handle.take() {
            if handle.join().is_err() {
                log::warn!("Video reader thread panicked");
            }
        }
    }
}
