//! Events sent from the engine to the host.

use serde::{Deserialize, Serialize};

use crate::types::{ErrorCode, ErrorDescriptor};

/// Events that the engine delivers to the host, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// The OS confirmed the broadcast; frames will now be counted.
    Started,

    /// The session ended normally.
    Stopped {
        /// Final number of video frames observed during the session.
        frame_count: u64,
    },

    /// Periodic frame throughput update.
    FrameCountUpdated {
        /// Frames observed so far in the current session.
        frame_count: u64,
    },

    /// The session (or a request) failed.
    Error(ErrorDescriptor),

    /// The user dismissed the source picker without choosing.
    UserCancelled,

    /// The OS paused sample delivery.
    Paused,

    /// The OS resumed sample delivery.
    Resumed,
}

impl SessionEvent {
    /// Returns the kind of this event without its payload.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Started => EventKind::Started,
            Self::Stopped { .. } => EventKind::Stopped,
            Self::FrameCountUpdated { .. } => EventKind::FrameCountUpdated,
            Self::Error(_) => EventKind::Error,
            Self::UserCancelled => EventKind::UserCancelled,
            Self::Paused => EventKind::Paused,
            Self::Resumed => EventKind::Resumed,
        }
    }

    /// Returns the frame count carried by this event, if any.
    pub fn frame_count(&self) -> Option<u64> {
        match self {
            Self::Stopped { frame_count } | Self::FrameCountUpdated { frame_count } => {
                Some(*frame_count)
            }
            _ => None,
        }
    }

    /// Returns true if this event ends the session it belongs to.
    ///
    /// An `alreadyActive` rejection leaves the running session untouched.
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Stopped { .. } | Self::UserCancelled => true,
            Self::Error(descriptor) => descriptor.code != ErrorCode::AlreadyActive,
            _ => false,
        }
    }
}

/// Payload-free discriminant of a [`SessionEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Started,
    Stopped,
    FrameCountUpdated,
    Error,
    UserCancelled,
    Paused,
    Resumed,
}
