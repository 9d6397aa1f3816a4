//! Session state machine types

use std::fmt;

/// Lifecycle of a gateway session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// TCP connect in progress
    Initializing,
    /// Connected, LOGIN sent, waiting for the session to open
    StartingSession,
    /// Session open, traffic flowing
    Online,
    /// No inbound traffic within the stale window
    Stale,
    /// Orderly shutdown in progress
    Stopping,
    /// Not connected
    Offline,
    /// Recoverable failure, reconnect may follow
    Error,
    /// Unrecoverable failure, no reconnect
    Fatal,
}

impl SessionState {
    /// Whether the engine may still try to bring the session back up
    pub fn recoverable(&self) -> bool {
        !matches!(self, SessionState::Stopping | SessionState::Fatal)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Initializing => "INITIALIZING",
            SessionState::StartingSession => "STARTING_SESSION",
            SessionState::Online => "ONLINE",
            SessionState::Stale => "STALE",
            SessionState::Stopping => "STOPPING",
            SessionState::Offline => "OFFLINE",
            SessionState::Error => "ERROR",
            SessionState::Fatal => "FATAL",
        };
        f.write_str(s)
    }
}

/// Listener for session state transitions. Single-subscriber:
/// re-registration replaces, unregistering is setting `None`.
pub trait StateListener: Send + Sync {
    fn on_state_changed(&self, state: SessionState, message: Option<&str>);
}
