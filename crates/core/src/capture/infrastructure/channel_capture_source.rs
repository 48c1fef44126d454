use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::capture::domain::capture_source::{CaptureError, CaptureSource};
use crate::shared::frame::Frame;

/// Capture source fed by another thread, e.g. a browser stream callback.
///
/// The producer keeps the [`Sender`] returned by [`ChannelCaptureSource::new`]
/// and pushes frames as they arrive. The channel is bounded; a producer that
/// outruns the recorder blocks, or can use `try_send` to drop frames.
pub struct ChannelCaptureSource {
    rx: Receiver<Frame>,
    timeout: Duration,
}

impl ChannelCaptureSource {
    pub fn new(capacity: usize, timeout: Duration) -> (Sender<Frame>, Self) {
        let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
        (tx, Self { rx, timeout })
    }
}

impl CaptureSource for ChannelCaptureSource {
    fn read(&mut self) -> Result<Frame, CaptureError> {
        match self.rx.recv_timeout(self.timeout) {
            Ok(frame) => Ok(frame),
            Err(RecvTimeoutError::Timeout) => Err(CaptureError::Unavailable),
            Err(RecvTimeoutError::Disconnected) => Err(CaptureError::Closed),
        }
    }
}
