//! Recording session state machine

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    Paused,
    /// Stop requested, waiting for the recorder's final fragment
    Stopping,
}

impl SessionState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Stopping => "stopping",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: SessionState,
    pub action: String,
}

impl InvalidStateTransition {
    pub(crate) fn new(current_state: SessionState, action: &str) -> Self {
        Self {
            current_state,
            action: action.to_string(),
        }
    }
}

/// Recording session lifecycle.
///
/// State machine:
///   IDLE -> RECORDING (start)
///   RECORDING -> PAUSED (pause)
///   PAUSED -> RECORDING (resume)
///   RECORDING | PAUSED -> STOPPING (request_stop)
///   STOPPING -> IDLE (finish_stop)
///   any -> IDLE (abort)
#[derive(Debug, Default)]
pub struct SessionLifecycle {
    state: SessionState,
}

impl SessionLifecycle {
    /// Create a new lifecycle in idle state
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    /// Get the current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    /// Recording flag as seen by the presentation layer (true while paused)
    pub fn is_recording(&self) -> bool {
        matches!(self.state, SessionState::Recording | SessionState::Paused)
    }

    pub fn is_paused(&self) -> bool {
        self.state == SessionState::Paused
    }

    /// Whether the duration counter should advance
    pub fn is_capturing(&self) -> bool {
        self.state == SessionState::Recording
    }

    /// Check that a start would be accepted, without transitioning
    pub fn ensure_can_start(&self) -> Result<(), InvalidStateTransition> {
        if self.state != SessionState::Idle {
            return Err(InvalidStateTransition::new(self.state, "start recording"));
        }
        Ok(())
    }

    /// Transition from IDLE to RECORDING
    pub fn start(&mut self) -> Result<(), InvalidStateTransition> {
        self.ensure_can_start()?;
        self.state = SessionState::Recording;
        Ok(())
    }

    /// Transition from RECORDING to PAUSED
    pub fn pause(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != SessionState::Recording {
            return Err(InvalidStateTransition::new(self.state, "pause recording"));
        }
        self.state = SessionState::Paused;
        Ok(())
    }

    /// Transition from PAUSED to RECORDING
    pub fn resume(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != SessionState::Paused {
            return Err(InvalidStateTransition::new(self.state, "resume recording"));
        }
        self.state = SessionState::Recording;
        Ok(())
    }

    /// Transition from RECORDING or PAUSED to STOPPING
    pub fn request_stop(&mut self) -> Result<(), InvalidStateTransition> {
        if !self.is_recording() {
            return Err(InvalidStateTransition::new(self.state, "stop recording"));
        }
        self.state = SessionState::Stopping;
        Ok(())
    }

    /// Transition from STOPPING to IDLE once the artifact is finalized
    pub fn finish_stop(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != SessionState::Stopping {
            return Err(InvalidStateTransition::new(self.state, "finalize recording"));
        }
        self.state = SessionState::Idle;
        Ok(())
    }

    /// Return to IDLE from any state (failure or teardown)
    pub fn abort(&mut self) {
        self.state = SessionState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_lifecycle_is_idle() {
        let lifecycle = SessionLifecycle::new();
        assert!(lifecycle.is_idle());
        assert!(!lifecycle.is_recording());
        assert!(!lifecycle.is_paused());
    }

    #[test]
    fn start_from_idle() {
        let mut lifecycle = SessionLifecycle::new();
        assert!(lifecycle.start().is_ok());
        assert!(lifecycle.is_recording());
        assert!(lifecycle.is_capturing());
    }

    #[test]
    fn start_while_recording_fails() {
        let mut lifecycle = SessionLifecycle::new();
        lifecycle.start().unwrap();

        let err = lifecycle.start().unwrap_err();
        assert_eq!(err.current_state, SessionState::Recording);
        assert!(err.action.contains("start recording"));
    }

    #[test]
    fn pause_and_resume() {
        let mut lifecycle = SessionLifecycle::new();
        lifecycle.start().unwrap();

        lifecycle.pause().unwrap();
        assert!(lifecycle.is_paused());
        assert!(lifecycle.is_recording());
        assert!(!lifecycle.is_capturing());

        lifecycle.resume().unwrap();
        assert!(!lifecycle.is_paused());
        assert!(lifecycle.is_capturing());
    }

    #[test]
    fn pause_from_idle_fails() {
        let mut lifecycle = SessionLifecycle::new();
        let err = lifecycle.pause().unwrap_err();
        assert_eq!(err.current_state, SessionState::Idle);
        assert!(lifecycle.is_idle());
    }

    #[test]
    fn resume_while_recording_fails() {
        let mut lifecycle = SessionLifecycle::new();
        lifecycle.start().unwrap();
        let err = lifecycle.resume().unwrap_err();
        assert_eq!(err.current_state, SessionState::Recording);
    }

    #[test]
    fn stop_from_paused() {
        let mut lifecycle = SessionLifecycle::new();
        lifecycle.start().unwrap();
        lifecycle.pause().unwrap();

        lifecycle.request_stop().unwrap();
        assert_eq!(lifecycle.state(), SessionState::Stopping);
        assert!(!lifecycle.is_recording());

        lifecycle.finish_stop().unwrap();
        assert!(lifecycle.is_idle());
    }

    #[test]
    fn stop_from_idle_fails() {
        let mut lifecycle = SessionLifecycle::new();
        assert!(lifecycle.request_stop().is_err());
        assert!(lifecycle.finish_stop().is_err());
    }

    #[test]
    fn start_while_stopping_fails() {
        let mut lifecycle = SessionLifecycle::new();
        lifecycle.start().unwrap();
        lifecycle.request_stop().unwrap();
        let err = lifecycle.start().unwrap_err();
        assert_eq!(err.current_state, SessionState::Stopping);
    }

    #[test]
    fn abort_returns_to_idle() {
        let mut lifecycle = SessionLifecycle::new();
        lifecycle.start().unwrap();
        lifecycle.pause().unwrap();
        lifecycle.abort();
        assert!(lifecycle.is_idle());
    }

    #[test]
    fn full_cycle() {
        let mut lifecycle = SessionLifecycle::new();
        lifecycle.start().unwrap();
        lifecycle.pause().unwrap();
        lifecycle.resume().unwrap();
        lifecycle.request_stop().unwrap();
        lifecycle.finish_stop().unwrap();

        // Can start another cycle
        lifecycle.start().unwrap();
        assert!(lifecycle.is_recording());
    }

    #[test]
    fn state_display() {
        assert_eq!(SessionState::Idle.to_string(), "idle");
        assert_eq!(SessionState::Paused.to_string(), "paused");
        assert_eq!(SessionState::Stopping.to_string(), "stopping");
    }

    #[test]
    fn error_display() {
        let err = InvalidStateTransition::new(SessionState::Idle, "pause recording");
        let msg = err.to_string();
        assert!(msg.contains("pause recording"));
        assert!(msg.contains("idle"));
    }
}
