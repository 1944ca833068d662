//! Session state machine types.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::types::ErrorDescriptor;

/// Identifier of a broadcast session, unique for the lifetime of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl SessionId {
    /// Returns the identifier following this one.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Lifecycle state of the broadcast session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    /// No session.
    #[default]
    Idle,

    /// The source picker is on screen.
    RequestingPicker,

    /// A controller handle was obtained; awaiting OS confirmation.
    Starting,

    /// Broadcast active, frames are being counted.
    Streaming,

    /// Stop requested; awaiting OS confirmation.
    Stopping,

    /// The session failed. Transient: the engine returns to `Idle` once the
    /// error event has been emitted.
    Error,
}

impl SessionState {
    /// Returns true if no session exists.
    pub fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns true if a session exists in any phase.
    pub fn is_active(self) -> bool {
        !self.is_idle()
    }

    /// Returns true if the broadcast is live.
    pub fn is_streaming(self) -> bool {
        matches!(self, Self::Streaming)
    }

    /// Returns true if the session is waiting on an OS confirmation.
    pub fn is_awaiting_os(self) -> bool {
        matches!(self, Self::Starting | Self::Stopping)
    }

    /// Returns a simple string representation of the state.
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::RequestingPicker => "RequestingPicker",
            Self::Starting => "Starting",
            Self::Streaming => "Streaming",
            Self::Stopping => "Stopping",
            Self::Error => "Error",
        }
    }
}

/// Consistent point-in-time view of the session, published by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Current session, if any.
    pub session: Option<SessionId>,

    /// Current lifecycle state.
    pub state: SessionState,

    /// Frames observed in the current (or most recently ended) session.
    pub frame_count: u64,

    /// Wall-clock time the OS confirmed the broadcast.
    pub started_at: Option<SystemTime>,

    /// Whether sample delivery is paused.
    pub paused: bool,

    /// Most recent error reported to the host.
    pub last_error: Option<ErrorDescriptor>,
}

impl SessionSnapshot {
    /// Returns true if the broadcast is live.
    pub fn is_streaming(&self) -> bool {
        self.state.is_streaming()
    }
}
