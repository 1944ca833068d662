//! Error types for the engine.

use screenstream_capture::PlatformError;
use thiserror::Error;

/// Errors raised inside the engine's components.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An adapter operation needs a controller handle but none is held.
    #[error("No active controller handle")]
    NoActiveHandle,

    /// A second controller handle was offered while one is held.
    #[error("Controller handle already held")]
    HandleAlreadyHeld,

    /// The picker is already on screen.
    #[error("Broadcast picker is already presented")]
    PickerAlreadyPresenting,

    /// The host dropped its event receiver.
    #[error("Host event receiver disconnected")]
    HostDisconnected,

    /// The engine is not draining its command channel.
    #[error("Engine command channel is full")]
    LaneFull,

    /// The engine loop is no longer running.
    #[error("Engine stopped")]
    EngineStopped,

    /// The platform rejected an operation.
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
