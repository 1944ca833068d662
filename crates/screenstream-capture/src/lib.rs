//! OS broadcast framework surface.
//!
//! The platform's broadcast picker, its controller entity and its delegate
//! callbacks are expressed as traits so the session engine can drive any
//! backend. [`sim`] provides a scriptable in-process backend.

mod error;
mod frame;
mod signal;
pub mod sim;

pub use error::PlatformError;
pub use frame::{FrameSample, SampleKind};
pub use signal::{PlatformSignal, SignalSink};

use std::sync::Arc;

/// Result type for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Opaque, exclusively owned reference to the OS broadcast controller.
pub type ControllerHandle = Box<dyn BroadcastController>;

/// Entry point into the OS broadcast framework.
pub trait BroadcastPlatform: Send + Sync {
    /// Whether screen broadcast is available on this device.
    fn is_supported(&self) -> bool;

    /// Ask the user for capture permission before any picker is shown.
    ///
    /// Platforms without a separate permission step grant it implicitly.
    fn request_permission(&self) -> PlatformResult<()> {
        Ok(())
    }

    /// Present the broadcast-source picker.
    ///
    /// The outcome is delivered later through `sink` as
    /// [`PlatformSignal::PickerConfirmed`] or [`PlatformSignal::PickerCancelled`].
    /// Controllers created from the selection report their callbacks to the
    /// same sink.
    fn present_picker(&self, sink: Arc<dyn SignalSink>) -> PlatformResult<()>;
}

/// The OS-level entity that performs capture for one session.
pub trait BroadcastController: Send {
    /// Ask the OS to start broadcasting. Confirmation arrives asynchronously.
    fn start_broadcast(&mut self) -> PlatformResult<()>;

    /// Ask the OS to finish broadcasting. Confirmation arrives asynchronously.
    fn finish_broadcast(&mut self) -> PlatformResult<()>;

    /// Hand the controller back to the OS. Consumes the handle.
    fn release(self: Box<Self>);
}
