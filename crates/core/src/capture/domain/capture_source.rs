use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// No frame right now (device busy, stream stalled). Worth retrying.
    #[error("no frame available from capture source")]
    Unavailable,
    /// The source ended; no further frames will arrive.
    #[error("capture source closed")]
    Closed,
    #[error("capture device error: {0}")]
    Device(String),
}

impl CaptureError {
    pub fn is_transient(&self) -> bool {
        matches!(self, CaptureError::Unavailable)
    }
}

/// Yields frames at whatever rate the device or stream delivers them.
///
/// Retry policy on transient failures belongs to the caller.
pub trait CaptureSource: Send {
    fn read(&mut self) -> Result<Frame, CaptureError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unavailable_is_transient() {
        assert!(CaptureError::Unavailable.is_transient());
        assert!(!CaptureError::Closed.is_transient());
        assert!(!CaptureError::Device("gone".into()).is_transient());
    }
}
