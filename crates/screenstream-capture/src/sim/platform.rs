//! Simulated broadcast platform.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::controller::{ControllerStats, SimController};
use crate::error::PlatformError;
use crate::frame::{FrameSample, SampleKind};
use crate::signal::{PlatformSignal, SignalSink};
use crate::{BroadcastPlatform, PlatformResult};

#[derive(Default)]
struct SimState {
    unsupported: bool,
    sink: Option<Arc<dyn SignalSink>>,
    presentations: u32,
    present_error: Option<PlatformError>,
    permission_error: Option<PlatformError>,
    permission_requests: u32,
    start_error: Option<PlatformError>,
    next_controller: u64,
    controllers: HashMap<u64, Arc<ControllerStats>>,
    stream_start: Option<Instant>,
    sequence: u64,
}

/// Scriptable stand-in for the OS broadcast framework.
///
/// Clones share state, so a test can keep one clone while the engine owns
/// another.
#[derive(Clone, Default)]
pub struct SimulatedPlatform {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedPlatform {
    /// Create a platform that supports broadcasting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a platform that reports broadcasting as unsupported.
    pub fn unsupported() -> Self {
        let platform = Self::default();
        platform.state.lock().unsupported = true;
        platform
    }

    /// Make the next `present_picker` call fail synchronously.
    pub fn fail_next_present(&self, err: PlatformError) {
        self.state.lock().present_error = Some(err);
    }

    /// Make the next permission request fail.
    pub fn deny_next_permission(&self, err: PlatformError) {
        self.state.lock().permission_error = Some(err);
    }

    /// Number of permission requests made so far.
    pub fn permission_requests(&self) -> u32 {
        self.state.lock().permission_requests
    }

    /// Make the next controller reject `start_broadcast` synchronously.
    pub fn fail_next_start(&self, err: PlatformError) {
        self.state.lock().start_error = Some(err);
    }

    /// Number of successful picker presentations.
    pub fn presentations(&self) -> u32 {
        self.state.lock().presentations
    }

    /// Call counters for a controller handed out earlier.
    pub fn controller(&self, id: u64) -> Option<Arc<ControllerStats>> {
        self.state.lock().controllers.get(&id).cloned()
    }

    /// Number of controllers handed out so far.
    pub fn controllers_created(&self) -> u64 {
        self.state.lock().next_controller
    }

    /// The user picks an extension. Returns the new controller's id.
    pub fn confirm_picker(&self) -> Option<u64> {
        let (sink, controller, id) = {
            let mut state = self.state.lock();
            let sink = state.sink.clone()?;
            state.next_controller += 1;
            let id = state.next_controller;
            let stats = Arc::new(ControllerStats::default());
            state.controllers.insert(id, Arc::clone(&stats));
            let controller = SimController::new(id, stats, state.start_error.take());
            (sink, controller, id)
        };

        debug!(controller = id, "Picker confirmed");
        sink.deliver(PlatformSignal::PickerConfirmed(Box::new(controller)));
        Some(id)
    }

    /// The user dismisses the picker.
    pub fn cancel_picker(&self) {
        self.fire(PlatformSignal::PickerCancelled);
    }

    /// The OS confirms the broadcast started.
    pub fn broadcast_started(&self) {
        {
            let mut state = self.state.lock();
            state.stream_start = Some(Instant::now());
            state.sequence = 0;
        }
        self.fire(PlatformSignal::BroadcastStarted);
    }

    /// The OS reports the broadcast finished.
    pub fn broadcast_finished(&self) {
        self.fire(PlatformSignal::BroadcastFinished);
    }

    /// The OS reports the broadcast failed.
    pub fn broadcast_failed(&self, err: PlatformError) {
        self.fire(PlatformSignal::BroadcastFailed(err));
    }

    /// The OS pauses sample delivery.
    pub fn broadcast_paused(&self) {
        self.fire(PlatformSignal::BroadcastPaused);
    }

    /// The OS resumes sample delivery.
    pub fn broadcast_resumed(&self) {
        self.fire(PlatformSignal::BroadcastResumed);
    }

    /// Deliver `count` video frames.
    pub fn deliver_frames(&self, count: u64) {
        for _ in 0..count {
            self.deliver_sample(SampleKind::Video);
        }
    }

    /// Deliver one sample of the given kind.
    pub fn deliver_sample(&self, kind: SampleKind) {
        let sample = {
            let mut state = self.state.lock();
            let start = *state.stream_start.get_or_insert_with(Instant::now);
            state.sequence += 1;
            FrameSample::captured(kind, start, state.sequence)
        };
        self.fire(PlatformSignal::FrameDelivered(sample));
    }

    fn fire(&self, signal: PlatformSignal) {
        let sink = self.state.lock().sink.clone();
        match sink {
            Some(sink) => sink.deliver(signal),
            None => warn!("No picker was presented, dropping {}", signal.name()),
        }
    }
}

impl BroadcastPlatform for SimulatedPlatform {
    fn is_supported(&self) -> bool {
        !self.state.lock().unsupported
    }

    fn request_permission(&self) -> PlatformResult<()> {
        let mut state = self.state.lock();
        state.permission_requests += 1;
        match state.permission_error.take() {
            Some(err) => {
                debug!("Permission denied: {}", err);
                Err(err)
            }
            None => Ok(()),
        }
    }

    fn present_picker(&self, sink: Arc<dyn SignalSink>) -> PlatformResult<()> {
        let mut state = self.state.lock();
        if state.unsupported {
            return Err(PlatformError::NotSupported);
        }
        if let Some(err) = state.present_error.take() {
            return Err(err);
        }
        state.presentations += 1;
        state.sink = Some(sink);
        debug!(presentations = state.presentations, "Picker presented");
        Ok(())
    }
}
