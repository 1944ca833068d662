//! Synchronous session controller.
//!
//! Feeds inputs through the [`SessionMachine`] and carries out the resulting
//! effects against the adapter, the picker and the host emitter. All calls
//! happen on one thread; the [`Engine`](crate::Engine) wraps this in a loop.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::Sender;
use parking_lot::RwLock;
use tracing::{debug, instrument, trace, warn};

use screenstream_capture::{BroadcastPlatform, ControllerHandle, PlatformSignal};
use screenstream_ipc::{SessionCommand, SessionConfig, SessionEvent, SessionId, SessionSnapshot};

use crate::adapter::BroadcastControllerAdapter;
use crate::emitter::EventEmitter;
use crate::error::EngineError;
use crate::input::{EngineInput, SessionSink};
use crate::machine::{Effect, Failure, MachineInput, SessionMachine};
use crate::picker::ActivityPickerCoordinator;

/// Owns the single broadcast session and everything attached to it.
pub struct SessionController {
    config: SessionConfig,
    machine: SessionMachine,
    adapter: BroadcastControllerAdapter,
    picker: ActivityPickerCoordinator,
    emitter: EventEmitter<SessionEvent>,
    signal_tx: Sender<EngineInput>,
    sink: Option<Arc<SessionSink>>,
    snapshot: Arc<RwLock<SessionSnapshot>>,
}

impl SessionController {
    /// Create a controller.
    ///
    /// `signal_tx` is the sending side of the platform signal lane this
    /// controller is fed from; sinks handed to the platform post into it.
    pub fn new(
        config: SessionConfig,
        platform: Arc<dyn BroadcastPlatform>,
        signal_tx: Sender<EngineInput>,
        event_tx: Sender<SessionEvent>,
    ) -> Self {
        Self {
            machine: SessionMachine::new(config.frame_update_interval),
            config,
            adapter: BroadcastControllerAdapter::new(),
            picker: ActivityPickerCoordinator::new(platform),
            emitter: EventEmitter::new(event_tx),
            signal_tx,
            sink: None,
            snapshot: Arc::new(RwLock::new(SessionSnapshot::default())),
        }
    }

    /// Shared, engine-written snapshot of the session.
    pub fn snapshot_handle(&self) -> Arc<RwLock<SessionSnapshot>> {
        Arc::clone(&self.snapshot)
    }

    /// Current view of the session.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.machine.snapshot()
    }

    /// Whether a controller handle is currently held.
    pub fn holds_handle(&self) -> bool {
        self.adapter.has_handle()
    }

    /// Handle one input. Returns false once the engine should stop.
    pub fn handle(&mut self, input: EngineInput) -> bool {
        let keep_running = match input {
            EngineInput::Command(command) => self.handle_command(command),
            EngineInput::Signal { session, signal } => {
                self.handle_signal(session, signal);
                true
            }
            EngineInput::FramesPending { session } => {
                self.collect_frames(session, Instant::now());
                true
            }
        };
        self.publish();
        keep_running
    }

    /// Force a watchdog failure if `Starting`/`Stopping` has lasted too long.
    pub fn check_deadline(&mut self, now: Instant) {
        let Some(timeout) = self.config.transition_timeout() else {
            return;
        };
        if !self.machine.state().is_awaiting_os() {
            return;
        }
        if now.saturating_duration_since(self.machine.phase_entered()) >= timeout {
            warn!(
                state = self.machine.state().name(),
                timeout_ms = timeout.as_millis() as u64,
                "OS confirmation overdue"
            );
            self.drive(MachineInput::DeadlineElapsed, None, now);
            self.publish();
        }
    }

    #[instrument(name = "session_command", skip(self))]
    fn handle_command(&mut self, command: SessionCommand) -> bool {
        debug!(?command, "Handling command");
        let now = Instant::now();

        // Frames the platform already delivered belong before this command.
        if let Some(session) = self.machine.session() {
            self.collect_frames(session, now);
        }

        match command {
            SessionCommand::StartStreaming => {
                let supported = self.picker.is_supported();
                self.drive(MachineInput::StartRequested { supported }, None, now);
            }
            SessionCommand::StopStreaming => self.drive(MachineInput::StopRequested, None, now),
            SessionCommand::Shutdown => {
                self.drive(MachineInput::Shutdown, None, now);
                return false;
            }
        }

        true
    }

    fn handle_signal(&mut self, session: SessionId, signal: PlatformSignal) {
        if self.machine.session() != Some(session) {
            trace!(%session, signal = signal.name(), "Dropping signal for ended session");
            if let PlatformSignal::PickerConfirmed(handle) = signal {
                BroadcastControllerAdapter::discard(handle);
            }
            return;
        }

        if !signal.is_frame() {
            self.collect_frames(session, Instant::now());
        }

        if matches!(
            signal,
            PlatformSignal::PickerConfirmed(_) | PlatformSignal::PickerCancelled
        ) {
            self.picker.resolve();
        }

        if let Some(translated) = self.adapter.translate(signal) {
            self.drive(translated.input, translated.incoming, Instant::now());
        }
    }

    /// Apply an input and run its effects, feeding adapter failures back in.
    fn drive(&mut self, input: MachineInput, mut incoming: Option<ControllerHandle>, now: Instant) {
        let mut pending: VecDeque<Effect> = self.machine.apply(input, now).into();

        while let Some(effect) = pending.pop_front() {
            if let Some(feedback) = self.execute(effect, &mut incoming) {
                pending.extend(self.machine.apply(feedback, Instant::now()));
            }
        }

        if let Some(handle) = incoming.take() {
            warn!("Controller handle was not consumed by the transition, releasing it");
            BroadcastControllerAdapter::discard(handle);
        }

        if self.machine.state().is_idle() {
            self.picker.resolve();
        }
    }

    fn execute(
        &mut self,
        effect: Effect,
        incoming: &mut Option<ControllerHandle>,
    ) -> Option<MachineInput> {
        match effect {
            Effect::PresentPicker => {
                let Some(session) = self.machine.session() else {
                    return Some(MachineInput::ContractBreach(
                        "picker requested without a session".to_string(),
                    ));
                };
                let sink = Arc::new(SessionSink::new(session, self.signal_tx.clone()));
                self.sink = Some(Arc::clone(&sink));
                match self.picker.present(sink) {
                    Ok(()) => None,
                    Err(EngineError::Platform(err)) => Some(MachineInput::PickerUnavailable(
                        BroadcastControllerAdapter::classify(&err),
                    )),
                    Err(other) => Some(MachineInput::PickerUnavailable(Failure::new(
                        other.to_string(),
                        true,
                    ))),
                }
            }
            Effect::AdoptHandle => match incoming.take() {
                Some(handle) => self
                    .adapter
                    .adopt(handle)
                    .err()
                    .map(|e| MachineInput::ContractBreach(e.to_string())),
                None => Some(MachineInput::ContractBreach(
                    "no controller handle to adopt".to_string(),
                )),
            },
            Effect::RejectHandle => {
                if let Some(handle) = incoming.take() {
                    BroadcastControllerAdapter::discard(handle);
                }
                None
            }
            Effect::StartBroadcast => self.adapter.start().err().and_then(|e| self.feedback(e)),
            Effect::StopBroadcast => self.adapter.stop().err().and_then(|e| self.feedback(e)),
            Effect::ReleaseHandle => {
                if !self.adapter.release() {
                    warn!("Release requested with no controller handle held");
                }
                None
            }
            Effect::Emit(event) => {
                if let Err(err) = self.emitter.emit(event) {
                    trace!(%err, "Event not delivered");
                }
                None
            }
        }
    }

    /// Count the frames waiting in the current session's sink.
    fn collect_frames(&mut self, session: SessionId, now: Instant) {
        let count = match &self.sink {
            Some(sink) if sink.session() == session => sink.take_frames(),
            _ => 0,
        };
        if count == 0 {
            return;
        }
        if self.machine.session() != Some(session) {
            trace!(%session, count, "Dropping frames for ended session");
            return;
        }
        self.drive(MachineInput::FramesDelivered(count), None, now);
    }

    fn feedback(&self, err: EngineError) -> Option<MachineInput> {
        if self.machine.holds_handle() {
            Some(BroadcastControllerAdapter::failure_input(err))
        } else {
            warn!("Adapter call failed after the session ended: {}", err);
            None
        }
    }

    fn publish(&self) {
        *self.snapshot.write() = self.machine.snapshot();
    }
}
