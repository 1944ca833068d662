//! Simulated broadcast controller.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::error::PlatformError;
use crate::{BroadcastController, PlatformResult};

/// Call counters for one simulated controller.
#[derive(Debug, Default)]
pub struct ControllerStats {
    starts: AtomicU32,
    finishes: AtomicU32,
    releases: AtomicU32,
}

impl ControllerStats {
    /// Number of `start_broadcast` calls.
    pub fn starts(&self) -> u32 {
        self.starts.load(Ordering::SeqCst)
    }

    /// Number of `finish_broadcast` calls.
    pub fn finishes(&self) -> u32 {
        self.finishes.load(Ordering::SeqCst)
    }

    /// Number of times the controller was released.
    pub fn releases(&self) -> u32 {
        self.releases.load(Ordering::SeqCst)
    }
}

/// A controller handed out by [`SimulatedPlatform`](super::SimulatedPlatform).
pub struct SimController {
    id: u64,
    stats: Arc<ControllerStats>,
    start_error: Option<PlatformError>,
}

impl SimController {
    pub(crate) fn new(id: u64, stats: Arc<ControllerStats>, start_error: Option<PlatformError>) -> Self {
        Self {
            id,
            stats,
            start_error,
        }
    }
}

impl BroadcastController for SimController {
    #[instrument(name = "sim_start_broadcast", skip(self), fields(controller = self.id))]
    fn start_broadcast(&mut self) -> PlatformResult<()> {
        self.stats.starts.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.start_error.take() {
            debug!("Rejecting start: {}", err);
            return Err(err);
        }
        Ok(())
    }

    #[instrument(name = "sim_finish_broadcast", skip(self), fields(controller = self.id))]
    fn finish_broadcast(&mut self) -> PlatformResult<()> {
        self.stats.finishes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release(self: Box<Self>) {
        debug!(controller = self.id, "Controller released");
        self.stats.releases.fetch_add(1, Ordering::SeqCst);
    }
}
