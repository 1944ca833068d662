//! Error types for the platform surface.

use thiserror::Error;

/// Errors reported by the OS broadcast framework.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Screen broadcast is not available on this device.
    #[error("Screen broadcast not supported")]
    NotSupported,

    /// The user or system denied capture permission.
    #[error("Permission denied for capture")]
    PermissionDenied,

    /// Broadcasting is disabled (e.g. by device restrictions).
    #[error("Broadcast disabled on this device")]
    Disabled,

    /// The framework refused to start the broadcast.
    #[error("Broadcast failed to start: {0}")]
    StartRejected(String),

    /// The broadcast extension terminated unexpectedly.
    #[error("Broadcast extension crashed")]
    ExtensionCrashed,

    /// The broadcast was interrupted by the system.
    #[error("Broadcast interrupted: {0}")]
    Interrupted(String),

    /// Not enough storage to continue.
    #[error("Insufficient storage")]
    InsufficientStorage,

    /// The controller no longer refers to a live broadcast.
    #[error("Invalid broadcast session")]
    InvalidSession,

    /// The picker is already on screen.
    #[error("Broadcast picker already presented")]
    PickerBusy,

    /// Unclassified platform error.
    #[error("Platform error {code}: {message}")]
    Platform { code: i64, message: String },
}

impl PlatformError {
    /// Classify a numeric recording-framework error code.
    pub fn from_code(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            -5801 => Self::PermissionDenied,
            -5802 => Self::Disabled,
            -5803 => Self::StartRejected(message),
            -5805 => Self::InsufficientStorage,
            -5806 => Self::Interrupted(message),
            -5808 => Self::InvalidSession,
            _ => Self::Platform { code, message },
        }
    }

    /// Returns true if retrying on this device can never succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::NotSupported | Self::Disabled)
    }
}
