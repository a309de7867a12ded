//! Recording session state

mod snapshot;
mod state;

pub use snapshot::{SessionErrorKind, SessionSnapshot};
pub use state::{InvalidStateTransition, SessionLifecycle, SessionState};
