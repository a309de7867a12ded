//! Application layer - Use cases and port interfaces
//!
//! Contains the recording session use case and trait definitions
//! for the host capture, recorder, object URL, download and config seams.

pub mod ports;
pub mod session;

// Re-export use cases
pub use session::{RecordingSession, SessionError};
