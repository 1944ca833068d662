//! Façade over the OS broadcast controller.

use tracing::{debug, info, instrument, warn};

use screenstream_capture::{ControllerHandle, PlatformError, PlatformSignal};

use crate::error::{EngineError, EngineResult};
use crate::machine::{Failure, MachineInput};

/// A platform signal translated for the state machine.
pub struct Translated {
    /// The machine input the signal maps to.
    pub input: MachineInput,

    /// Controller handle carried by a picker confirmation.
    pub incoming: Option<ControllerHandle>,
}

/// Owns the controller handle for the lifetime of a session.
///
/// The handle is released exactly once: [`release`](Self::release) takes it
/// out of the adapter, and dropping the adapter releases whatever is left.
#[derive(Default)]
pub struct BroadcastControllerAdapter {
    handle: Option<ControllerHandle>,
    releases: u64,
}

impl BroadcastControllerAdapter {
    /// Create an adapter holding no handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a controller handle is held.
    pub fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    /// Number of handles released by this adapter.
    pub fn releases(&self) -> u64 {
        self.releases
    }

    /// Take ownership of a new controller handle.
    ///
    /// If a handle is already held the incoming one is released immediately.
    pub fn adopt(&mut self, handle: ControllerHandle) -> EngineResult<()> {
        if self.handle.is_some() {
            warn!("Controller handle offered while one is held, releasing the new one");
            Self::discard(handle);
            return Err(EngineError::HandleAlreadyHeld);
        }
        debug!("Controller handle adopted");
        self.handle = Some(handle);
        Ok(())
    }

    /// Release a handle that was never adopted.
    pub fn discard(handle: ControllerHandle) {
        debug!("Releasing unadopted controller handle");
        handle.release();
    }

    /// Ask the OS to start broadcasting.
    #[instrument(name = "adapter_start", skip(self))]
    pub fn start(&mut self) -> EngineResult<()> {
        let handle = self.handle.as_mut().ok_or(EngineError::NoActiveHandle)?;
        handle.start_broadcast()?;
        info!("Broadcast start requested");
        Ok(())
    }

    /// Ask the OS to stop broadcasting.
    #[instrument(name = "adapter_stop", skip(self))]
    pub fn stop(&mut self) -> EngineResult<()> {
        let handle = self.handle.as_mut().ok_or(EngineError::NoActiveHandle)?;
        handle.finish_broadcast()?;
        info!("Broadcast stop requested");
        Ok(())
    }

    /// Release the held handle. Returns false if nothing was held.
    pub fn release(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.release();
                self.releases += 1;
                debug!(releases = self.releases, "Controller handle released");
                true
            }
            None => false,
        }
    }

    /// Map one platform callback to exactly one machine input.
    ///
    /// Non-video samples map to nothing.
    pub fn translate(&self, signal: PlatformSignal) -> Option<Translated> {
        let (input, incoming) = match signal {
            PlatformSignal::PickerConfirmed(handle) => (MachineInput::PickerConfirmed, Some(handle)),
            PlatformSignal::PickerCancelled => (MachineInput::PickerCancelled, None),
            PlatformSignal::BroadcastStarted => (MachineInput::BroadcastStarted, None),
            PlatformSignal::BroadcastFinished => (MachineInput::BroadcastFinished, None),
            PlatformSignal::BroadcastFailed(err) => {
                (MachineInput::BroadcastFailed(Self::classify(&err)), None)
            }
            PlatformSignal::BroadcastPaused => (MachineInput::BroadcastPaused, None),
            PlatformSignal::BroadcastResumed => (MachineInput::BroadcastResumed, None),
            PlatformSignal::FrameDelivered(sample) if sample.is_video() => {
                (MachineInput::FramesDelivered(1), None)
            }
            PlatformSignal::FrameDelivered(_) => return None,
        };
        Some(Translated { input, incoming })
    }

    /// Best-effort classification of a platform error.
    pub fn classify(err: &PlatformError) -> Failure {
        let message = match err {
            PlatformError::PermissionDenied => "Screen capture permission denied or revoked".to_string(),
            PlatformError::ExtensionCrashed => "Broadcast extension terminated unexpectedly".to_string(),
            other => other.to_string(),
        };
        Failure::new(message, !err.is_permanent())
    }

    /// Turn an adapter error into the machine input that resolves it.
    pub fn failure_input(err: EngineError) -> MachineInput {
        match err {
            EngineError::Platform(platform) => MachineInput::BroadcastFailed(Self::classify(&platform)),
            other => MachineInput::ContractBreach(other.to_string()),
        }
    }
}

impl Drop for BroadcastControllerAdapter {
    fn drop(&mut self) {
        if self.release() {
            warn!("Adapter dropped while holding a controller handle");
        }
    }
}
