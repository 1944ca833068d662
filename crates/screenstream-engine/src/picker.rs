//! Bridge to the OS broadcast-source picker.

use std::sync::Arc;

use tracing::{debug, instrument};

use screenstream_capture::{BroadcastPlatform, SignalSink};

use crate::error::{EngineError, EngineResult};

/// Presents the picker once per request and tracks whether it is on screen.
pub struct ActivityPickerCoordinator {
    platform: Arc<dyn BroadcastPlatform>,
    presenting: bool,
}

impl ActivityPickerCoordinator {
    /// Create a coordinator for the given platform.
    pub fn new(platform: Arc<dyn BroadcastPlatform>) -> Self {
        Self {
            platform,
            presenting: false,
        }
    }

    /// Whether the platform can broadcast at all.
    pub fn is_supported(&self) -> bool {
        self.platform.is_supported()
    }

    /// Whether the picker is on screen.
    pub fn is_presenting(&self) -> bool {
        self.presenting
    }

    /// Request capture permission, then present the picker. The user's
    /// choice is delivered through `sink`.
    #[instrument(name = "present_picker", skip_all)]
    pub fn present(&mut self, sink: Arc<dyn SignalSink>) -> EngineResult<()> {
        if self.presenting {
            return Err(EngineError::PickerAlreadyPresenting);
        }
        self.platform.request_permission()?;
        self.platform.present_picker(sink)?;
        self.presenting = true;
        debug!("Picker presented");
        Ok(())
    }

    /// The picker produced a result (or the session ended without one).
    pub fn resolve(&mut self) {
        if self.presenting {
            debug!("Picker resolved");
        }
        self.presenting = false;
    }
}
