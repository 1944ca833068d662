//! Typed host<->engine messages for screen broadcast sessions.
//!
//! This crate defines the message types exchanged between the host
//! application and the broadcast session engine.

mod commands;
mod events;
mod state;
mod types;

pub use commands::SessionCommand;
pub use events::{EventKind, SessionEvent};
pub use state::{SessionId, SessionSnapshot, SessionState};
pub use types::{ConfigError, ErrorCode, ErrorDescriptor, SessionConfig};

use crossbeam_channel::{Receiver, Sender};

/// Default capacity of the engine's platform signal lane.
pub const INPUT_CHANNEL_CAPACITY: usize = 256;

/// Capacity of the host command channel.
pub const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Default number of video frames between `FrameCountUpdated` events.
pub const DEFAULT_FRAME_UPDATE_INTERVAL: u32 = 10;

/// Creates the command channel (Host → Engine).
pub fn command_channel() -> (Sender<SessionCommand>, Receiver<SessionCommand>) {
    crossbeam_channel::bounded(COMMAND_CHANNEL_CAPACITY)
}

/// Creates the event channel (Engine → Host).
///
/// The channel is a rendezvous channel: the engine hands over one event at a
/// time and blocks until the host has taken it.
pub fn event_channel() -> (Sender<SessionEvent>, Receiver<SessionEvent>) {
    crossbeam_channel::bounded(0)
}
