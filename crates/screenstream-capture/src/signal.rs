//! Delegate callbacks from the OS broadcast framework.

use std::fmt;

use crate::error::PlatformError;
use crate::frame::FrameSample;
use crate::ControllerHandle;

/// One asynchronous notification from the platform.
pub enum PlatformSignal {
    /// The user picked a broadcast extension; carries the new controller.
    PickerConfirmed(ControllerHandle),

    /// The user dismissed the picker.
    PickerCancelled,

    /// The OS confirmed the broadcast started.
    BroadcastStarted,

    /// The OS reports the broadcast finished.
    BroadcastFinished,

    /// The OS reports the broadcast failed.
    BroadcastFailed(PlatformError),

    /// Sample delivery paused.
    BroadcastPaused,

    /// Sample delivery resumed.
    BroadcastResumed,

    /// One captured sample.
    FrameDelivered(FrameSample),
}

impl PlatformSignal {
    /// Returns a simple string representation of the signal.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PickerConfirmed(_) => "PickerConfirmed",
            Self::PickerCancelled => "PickerCancelled",
            Self::BroadcastStarted => "BroadcastStarted",
            Self::BroadcastFinished => "BroadcastFinished",
            Self::BroadcastFailed(_) => "BroadcastFailed",
            Self::BroadcastPaused => "BroadcastPaused",
            Self::BroadcastResumed => "BroadcastResumed",
            Self::FrameDelivered(_) => "FrameDelivered",
        }
    }

    /// Returns true for per-sample notifications.
    pub fn is_frame(&self) -> bool {
        matches!(self, Self::FrameDelivered(_))
    }
}

impl fmt::Debug for PlatformSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BroadcastFailed(err) => f.debug_tuple("BroadcastFailed").field(err).finish(),
            Self::FrameDelivered(sample) => {
                f.debug_tuple("FrameDelivered").field(sample).finish()
            }
            other => f.write_str(other.name()),
        }
    }
}

/// Receiver of platform callbacks for one session.
///
/// Implementations must not block the calling OS thread on frame signals.
pub trait SignalSink: Send + Sync {
    /// Deliver one callback.
    fn deliver(&self, signal: PlatformSignal);
}
