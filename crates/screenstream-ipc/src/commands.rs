//! Commands sent from the host to the engine.

use serde::{Deserialize, Serialize};

/// Requests the host can issue to the session engine.
///
/// Every command returns immediately; outcomes arrive as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionCommand {
    /// Begin a new broadcast session (presents the source picker).
    StartStreaming,

    /// Stop the current broadcast session. A no-op while idle.
    StopStreaming,

    /// Stop any active session and terminate the engine loop.
    Shutdown,
}
