use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderPhase {
    Idle,
    Recording,
    Finalizing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderEvent {
    Start,
    Stop,
    AutoStop,
    Finalized,
    Abort,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderError {
    #[error("a recording is already in progress ({0:?})")]
    AlreadyActive(RecorderPhase),
    #[error("{event:?} is not valid while {phase:?}")]
    InvalidTransition {
        phase: RecorderPhase,
        event: RecorderEvent,
    },
}

impl RecorderPhase {
    /// Pure transition table for the recorder.
    pub fn transition(self, event: RecorderEvent) -> Result<RecorderPhase, RecorderError> {
        use RecorderEvent::*;
        use RecorderPhase::*;

        match (self, event) {
            (Idle, Start) => Ok(Recording),
            (phase, Start) => Err(RecorderError::AlreadyActive(phase)),
            (Recording, Stop | AutoStop) => Ok(Finalizing),
            (Finalizing, Finalized) => Ok(Idle),
            (_, Abort) => Ok(Idle),
            (phase, event) => Err(RecorderError::InvalidTransition { phase, event }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Manual,
    DurationElapsed,
    SourceClosed,
}

/// Guards the single active recording of a process or studio.
///
/// Shared between the acquisition loop and whatever issues stop requests.
/// Manual stop and the duration deadline are evaluated together in
/// [`RecordingController::stop_reason`], so both stop paths behave the same.
pub struct RecordingController {
    phase: Mutex<RecorderPhase>,
    stop_requested: AtomicBool,
}

impl RecordingController {
    pub fn new() -> Self {
        Self {
            phase: Mutex::new(RecorderPhase::Idle),
            stop_requested: AtomicBool::new(false),
        }
    }

    pub fn phase(&self) -> RecorderPhase {
        *self.lock()
    }

    /// `Idle → Recording`. Rejects a second start instead of resetting.
    pub fn start(&self) -> Result<(), RecorderError> {
        let mut phase = self.lock();
        *phase = phase.transition(RecorderEvent::Start)?;
        self.stop_requested.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Asks the acquisition loop to stop at its next check.
    pub fn request_stop(&self) -> Result<(), RecorderError> {
        let phase = self.lock();
        if *phase != RecorderPhase::Recording {
            return Err(RecorderError::InvalidTransition {
                phase: *phase,
                event: RecorderEvent::Stop,
            });
        }
        self.stop_requested.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// The single point where manual stop and the deadline are checked.
    pub fn stop_reason(
        &self,
        started_at: Instant,
        now: Instant,
        duration: Duration,
    ) -> Option<StopReason> {
        if self.stop_requested.load(Ordering::SeqCst) {
            Some(StopReason::Manual)
        } else if now.saturating_duration_since(started_at) >= duration {
            Some(StopReason::DurationElapsed)
        } else {
            None
        }
    }

    /// `Recording → Finalizing`.
    pub fn begin_finalizing(&self, reason: StopReason) -> Result<(), RecorderError> {
        let event = match reason {
            StopReason::Manual => RecorderEvent::Stop,
            StopReason::DurationElapsed | StopReason::SourceClosed => RecorderEvent::AutoStop,
        };
        let mut phase = self.lock();
        *phase = phase.transition(event)?;
        Ok(())
    }

    /// `Finalizing → Idle`.
    pub fn finish(&self) -> Result<(), RecorderError> {
        let mut phase = self.lock();
        *phase = phase.transition(RecorderEvent::Finalized)?;
        self.stop_requested.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Returns to `Idle` from any phase.
    pub fn abort(&self) {
        let mut phase = self.lock();
        *phase = RecorderPhase::Idle;
        self.stop_requested.store(false, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RecorderPhase> {
        // Phase is Copy, so a poisoned lock still holds a whole value.
        self.phase.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for RecordingController {
    fn default() -> Self {
        Self::new()
    }
}
