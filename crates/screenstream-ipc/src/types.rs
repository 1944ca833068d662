//! Common types used across IPC messages.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{DEFAULT_FRAME_UPDATE_INTERVAL, INPUT_CHANNEL_CAPACITY};

/// Classification of an error reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    /// Start requested while a session is already in progress.
    AlreadyActive,

    /// The user declined the source picker.
    PickerCancelled,

    /// The capture framework rejected the start.
    OsStartFailed,

    /// The session died mid-stream (extension crash, permission revoked).
    OsRuntimeFailure,

    /// A callback arrived that the session could not have produced.
    AdapterInvariantViolation,
}

impl ErrorCode {
    /// Returns the wire name of this code.
    pub fn name(self) -> &'static str {
        match self {
            Self::AlreadyActive => "alreadyActive",
            Self::PickerCancelled => "pickerCancelled",
            Self::OsStartFailed => "osStartFailed",
            Self::OsRuntimeFailure => "osRuntimeFailure",
            Self::AdapterInvariantViolation => "adapterInvariantViolation",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error payload carried by `SessionEvent::Error`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ErrorDescriptor {
    /// Error classification.
    pub code: ErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Whether the host may simply retry.
    pub recoverable: bool,
}

impl ErrorDescriptor {
    /// Create a new descriptor.
    pub fn new(code: ErrorCode, message: impl Into<String>, recoverable: bool) -> Self {
        Self {
            code,
            message: message.into(),
            recoverable,
        }
    }

    /// Start rejected because a session is in progress.
    pub fn already_active() -> Self {
        Self::new(
            ErrorCode::AlreadyActive,
            "A broadcast session is already in progress",
            true,
        )
    }

    /// The capture framework refused to start.
    pub fn os_start_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::OsStartFailed, message, true)
    }

    /// The session failed after it was confirmed.
    pub fn os_runtime_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::OsRuntimeFailure, message, true)
    }

    /// Host/OS contract breach.
    pub fn invariant_violation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AdapterInvariantViolation, message, false)
    }
}

/// Errors in a [`SessionConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Frame update interval must be at least one frame.
    #[error("frame_update_interval must be at least 1")]
    ZeroFrameInterval,

    /// Input lane needs room for at least one message.
    #[error("input_channel_capacity must be at least 1")]
    ZeroInputCapacity,

    /// Watchdog timeout of zero would fail every session immediately.
    #[error("transition_timeout_ms must be greater than 0 when set")]
    ZeroTransitionTimeout,
}

/// Configuration for the session engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Emit `FrameCountUpdated` whenever the frame count is a multiple of this.
    pub frame_update_interval: u32,

    /// Optional watchdog for the `Starting`/`Stopping` states.
    pub transition_timeout_ms: Option<u64>,

    /// Capacity of the engine's platform signal lane.
    pub input_channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame_update_interval: DEFAULT_FRAME_UPDATE_INTERVAL,
            transition_timeout_ms: None,
            input_channel_capacity: INPUT_CHANNEL_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Check the configuration for values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_update_interval == 0 {
            return Err(ConfigError::ZeroFrameInterval);
        }
        if self.input_channel_capacity == 0 {
            return Err(ConfigError::ZeroInputCapacity);
        }
        if self.transition_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroTransitionTimeout);
        }
        Ok(())
    }

    /// Watchdog deadline as a duration.
    pub fn transition_timeout(&self) -> Option<Duration> {
        self.transition_timeout_ms.map(Duration::from_millis)
    }
}
