//! Session lifecycle state machine.
//!
//! The machine is pure bookkeeping: it consumes one [`MachineInput`] at a
//! time, updates the session phase and returns the [`Effect`]s the
//! controller must carry out, in order. It never touches the platform or the
//! host directly.

use std::time::{Instant, SystemTime};

use tracing::{debug, error, info, trace, warn};

use screenstream_ipc::{
    ErrorCode, ErrorDescriptor, SessionEvent, SessionId, SessionSnapshot, SessionState,
};

use crate::frame_counter::FrameCounter;

/// A platform failure, already classified by the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Human-readable description.
    pub message: String,

    /// Whether retrying on this device can succeed.
    pub recoverable: bool,
}

impl Failure {
    /// Create a new failure.
    pub fn new(message: impl Into<String>, recoverable: bool) -> Self {
        Self {
            message: message.into(),
            recoverable,
        }
    }
}

/// Inputs consumed by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineInput {
    /// Host asked to start a session.
    StartRequested {
        /// Whether the platform can broadcast at all.
        supported: bool,
    },

    /// Host asked to stop the session.
    StopRequested,

    /// Engine is shutting down.
    Shutdown,

    /// User picked a broadcast extension; the controller holds the new handle.
    PickerConfirmed,

    /// User dismissed the picker.
    PickerCancelled,

    /// The picker could not be presented.
    PickerUnavailable(Failure),

    /// OS confirmed the broadcast started.
    BroadcastStarted,

    /// OS reports the broadcast finished.
    BroadcastFinished,

    /// OS reports the broadcast failed.
    BroadcastFailed(Failure),

    /// OS paused sample delivery.
    BroadcastPaused,

    /// OS resumed sample delivery.
    BroadcastResumed,

    /// This many video frames were captured since the last report.
    FramesDelivered(u64),

    /// The watchdog deadline for `Starting`/`Stopping` passed.
    DeadlineElapsed,

    /// The adapter detected a contract breach.
    ContractBreach(String),
}

/// Side effects requested by a transition, executed in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Present the broadcast-source picker.
    PresentPicker,

    /// Store the incoming controller handle in the adapter.
    AdoptHandle,

    /// Release the incoming controller handle without storing it.
    RejectHandle,

    /// Ask the adapter to start the broadcast.
    StartBroadcast,

    /// Ask the adapter to stop the broadcast.
    StopBroadcast,

    /// Release the held controller handle.
    ReleaseHandle,

    /// Deliver an event to the host.
    Emit(SessionEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    RequestingPicker { stop_pending: bool },
    Starting,
    Streaming { paused: bool },
    Stopping { awaiting_start: bool },
    Failed,
}

impl Phase {
    fn state(self) -> SessionState {
        match self {
            Self::Idle => SessionState::Idle,
            Self::RequestingPicker { .. } => SessionState::RequestingPicker,
            Self::Starting => SessionState::Starting,
            Self::Streaming { .. } => SessionState::Streaming,
            Self::Stopping { .. } => SessionState::Stopping,
            Self::Failed => SessionState::Error,
        }
    }

    fn holds_handle(self) -> bool {
        matches!(
            self,
            Self::Starting | Self::Streaming { .. } | Self::Stopping { .. }
        )
    }
}

/// Owns the lifecycle state of the single broadcast session.
pub struct SessionMachine {
    phase: Phase,
    phase_entered: Instant,
    session: Option<SessionId>,
    last_session: SessionId,
    counter: FrameCounter,
    started_at: Option<SystemTime>,
    last_error: Option<ErrorDescriptor>,
}

impl SessionMachine {
    /// Create an idle machine emitting frame updates every `frame_update_interval` frames.
    pub fn new(frame_update_interval: u32) -> Self {
        Self {
            phase: Phase::Idle,
            phase_entered: Instant::now(),
            session: None,
            last_session: SessionId(0),
            counter: FrameCounter::new(frame_update_interval),
            started_at: None,
            last_error: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.phase.state()
    }

    /// Current session, if any.
    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    /// Frames counted in the current or most recent session.
    pub fn frame_count(&self) -> u64 {
        self.counter.current()
    }

    /// Whether the current phase owns a controller handle.
    pub fn holds_handle(&self) -> bool {
        self.phase.holds_handle()
    }

    /// When the current phase was entered.
    pub fn phase_entered(&self) -> Instant {
        self.phase_entered
    }

    /// Consistent view of the session.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session: self.session,
            state: self.state(),
            frame_count: self.counter.current(),
            started_at: self.started_at,
            paused: matches!(self.phase, Phase::Streaming { paused: true }),
            last_error: self.last_error.clone(),
        }
    }

    /// Consume one input and return the effects to execute.
    pub fn apply(&mut self, input: MachineInput, now: Instant) -> Vec<Effect> {
        match input {
            MachineInput::StartRequested { supported } => self.on_start(supported, now),
            MachineInput::StopRequested => self.on_stop(now),
            MachineInput::Shutdown => self.on_shutdown(now),
            MachineInput::PickerConfirmed => self.on_picker_confirmed(now),
            MachineInput::PickerCancelled => self.on_picker_cancelled(now),
            MachineInput::PickerUnavailable(failure) => self.on_picker_unavailable(failure, now),
            MachineInput::BroadcastStarted => self.on_started(now),
            MachineInput::BroadcastFinished => self.on_finished(now),
            MachineInput::BroadcastFailed(failure) => self.on_failed(failure, now),
            MachineInput::BroadcastPaused => self.on_pause_changed(true, now),
            MachineInput::BroadcastResumed => self.on_pause_changed(false, now),
            MachineInput::FramesDelivered(count) => self.on_frames(count),
            MachineInput::DeadlineElapsed => self.on_deadline(now),
            MachineInput::ContractBreach(message) => self.violation(message, now),
        }
    }

    fn on_start(&mut self, supported: bool, now: Instant) -> Vec<Effect> {
        if self.phase != Phase::Idle {
            debug!(state = self.state().name(), "Start rejected, session in progress");
            return vec![self.report(ErrorDescriptor::already_active())];
        }

        if !supported {
            warn!("Start rejected, screen broadcast not supported");
            return vec![self.report(ErrorDescriptor::new(
                ErrorCode::OsStartFailed,
                "Screen broadcast not supported on this device",
                false,
            ))];
        }

        let id = self.last_session.next();
        self.last_session = id;
        self.session = Some(id);
        self.counter.reset();
        self.counter.disarm();
        self.started_at = None;

        info!(session = %id, "Session created");
        self.transition_to(Phase::RequestingPicker { stop_pending: false }, now);
        vec![Effect::PresentPicker]
    }

    fn on_stop(&mut self, now: Instant) -> Vec<Effect> {
        match self.phase {
            Phase::Idle => {
                debug!("Stop while idle, ignoring");
                Vec::new()
            }
            Phase::RequestingPicker { .. } => {
                debug!("Stop while picker is up, deferring until the picker resolves");
                self.phase = Phase::RequestingPicker { stop_pending: true };
                Vec::new()
            }
            Phase::Starting => {
                self.transition_to(Phase::Stopping { awaiting_start: true }, now);
                Vec::new()
            }
            Phase::Streaming { .. } => {
                self.counter.disarm();
                self.transition_to(Phase::Stopping { awaiting_start: false }, now);
                vec![Effect::StopBroadcast]
            }
            Phase::Stopping { .. } | Phase::Failed => Vec::new(),
        }
    }

    fn on_shutdown(&mut self, now: Instant) -> Vec<Effect> {
        let mut effects = match self.phase {
            Phase::Idle | Phase::Failed => return Vec::new(),
            Phase::RequestingPicker { .. } => Vec::new(),
            Phase::Streaming { .. } => vec![Effect::StopBroadcast, Effect::ReleaseHandle],
            Phase::Starting | Phase::Stopping { .. } => vec![Effect::ReleaseHandle],
        };

        info!(state = self.state().name(), "Ending session for shutdown");
        let frame_count = self.counter.current();
        self.end_session(now);
        effects.push(Effect::Emit(SessionEvent::Stopped { frame_count }));
        effects
    }

    fn on_picker_confirmed(&mut self, now: Instant) -> Vec<Effect> {
        match self.phase {
            Phase::RequestingPicker { stop_pending: true } => {
                debug!("Picker confirmed after stop request, discarding controller");
                self.end_session(now);
                vec![
                    Effect::RejectHandle,
                    Effect::Emit(SessionEvent::Stopped { frame_count: 0 }),
                ]
            }
            Phase::RequestingPicker { stop_pending: false } => {
                self.transition_to(Phase::Starting, now);
                vec![Effect::AdoptHandle, Effect::StartBroadcast]
            }
            _ => {
                let mut effects = vec![Effect::RejectHandle];
                effects.extend(self.violation("picker confirmed with no picker on screen", now));
                effects
            }
        }
    }

    fn on_picker_cancelled(&mut self, now: Instant) -> Vec<Effect> {
        match self.phase {
            Phase::RequestingPicker { .. } => {
                info!("User cancelled the picker");
                self.end_session(now);
                vec![Effect::Emit(SessionEvent::UserCancelled)]
            }
            _ => self.violation("picker cancelled with no picker on screen", now),
        }
    }

    fn on_picker_unavailable(&mut self, failure: Failure, now: Instant) -> Vec<Effect> {
        match self.phase {
            Phase::RequestingPicker { .. } => self.fail(
                ErrorDescriptor::new(ErrorCode::OsStartFailed, failure.message, failure.recoverable),
                now,
            ),
            _ => self.violation("picker failure with no picker requested", now),
        }
    }

    fn on_started(&mut self, now: Instant) -> Vec<Effect> {
        match self.phase {
            Phase::Starting => {
                self.counter.reset();
                self.started_at = Some(SystemTime::now());
                self.transition_to(Phase::Streaming { paused: false }, now);
                info!(session = ?self.session, "Broadcast started");
                vec![Effect::Emit(SessionEvent::Started)]
            }
            Phase::Stopping {
                awaiting_start: true,
            } => {
                debug!("Start confirmed, issuing deferred stop");
                self.transition_to(Phase::Stopping { awaiting_start: false }, now);
                vec![Effect::StopBroadcast]
            }
            Phase::Streaming { .. } | Phase::Stopping { .. } => {
                warn!("Duplicate start confirmation, ignoring");
                Vec::new()
            }
            Phase::Idle | Phase::RequestingPicker { .. } | Phase::Failed => {
                self.violation("start confirmation without a controller handle", now)
            }
        }
    }

    fn on_finished(&mut self, now: Instant) -> Vec<Effect> {
        match self.phase {
            Phase::Starting => self.fail(
                ErrorDescriptor::os_start_failed("Broadcast finished before start was confirmed"),
                now,
            ),
            Phase::Streaming { .. } | Phase::Stopping { .. } => {
                let frame_count = self.counter.current();
                info!(frame_count, "Broadcast finished");
                self.end_session(now);
                vec![
                    Effect::ReleaseHandle,
                    Effect::Emit(SessionEvent::Stopped { frame_count }),
                ]
            }
            Phase::Idle | Phase::RequestingPicker { .. } | Phase::Failed => {
                self.violation("finish notification without a controller handle", now)
            }
        }
    }

    fn on_failed(&mut self, failure: Failure, now: Instant) -> Vec<Effect> {
        let code = match self.phase {
            Phase::Starting
            | Phase::Stopping {
                awaiting_start: true,
            } => ErrorCode::OsStartFailed,
            Phase::Streaming { .. } | Phase::Stopping { .. } => ErrorCode::OsRuntimeFailure,
            Phase::Idle | Phase::RequestingPicker { .. } | Phase::Failed => {
                return self.violation(
                    format!(
                        "failure notification without a controller handle: {}",
                        failure.message
                    ),
                    now,
                );
            }
        };
        self.fail(
            ErrorDescriptor::new(code, failure.message, failure.recoverable),
            now,
        )
    }

    fn on_pause_changed(&mut self, paused: bool, now: Instant) -> Vec<Effect> {
        match self.phase {
            Phase::Streaming { paused: current } if current != paused => {
                self.phase = Phase::Streaming { paused };
                if paused {
                    info!(frame_count = self.counter.current(), "Broadcast paused");
                    vec![Effect::Emit(SessionEvent::Paused)]
                } else {
                    info!("Broadcast resumed");
                    vec![Effect::Emit(SessionEvent::Resumed)]
                }
            }
            Phase::Streaming { .. } | Phase::Starting | Phase::Stopping { .. } => {
                debug!(paused, state = self.state().name(), "Ignoring pause change");
                Vec::new()
            }
            Phase::Idle | Phase::RequestingPicker { .. } | Phase::Failed => {
                self.violation("pause notification without a controller handle", now)
            }
        }
    }

    fn on_frames(&mut self, count: u64) -> Vec<Effect> {
        if self.phase != (Phase::Streaming { paused: false }) {
            trace!(count, state = self.state().name(), "Frames outside live streaming, ignoring");
            return Vec::new();
        }

        let mut effects = Vec::new();
        for _ in 0..count {
            let Some(frame_count) = self.counter.increment() else {
                break;
            };
            if frame_count <= 5 || frame_count % 100 == 0 {
                trace!(frame_count, "Frame counted");
            }
            if self.counter.update_due() {
                effects.push(Effect::Emit(SessionEvent::FrameCountUpdated { frame_count }));
            }
        }
        effects
    }

    fn on_deadline(&mut self, now: Instant) -> Vec<Effect> {
        match self.phase {
            Phase::Starting | Phase::Stopping { .. } => {
                let message = format!(
                    "Timed out waiting for the OS in {} state",
                    self.state().name()
                );
                self.fail(ErrorDescriptor::os_runtime_failure(message), now)
            }
            _ => Vec::new(),
        }
    }

    fn violation(&mut self, message: impl Into<String>, now: Instant) -> Vec<Effect> {
        let message = message.into();
        error!(state = self.state().name(), "Adapter invariant violation: {}", message);
        self.fail(ErrorDescriptor::invariant_violation(message), now)
    }

    /// Error → Idle, releasing the handle first if one is held.
    fn fail(&mut self, descriptor: ErrorDescriptor, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::with_capacity(2);
        if self.phase.holds_handle() {
            effects.push(Effect::ReleaseHandle);
        }

        warn!(code = %descriptor.code, "Session failed: {}", descriptor.message);
        self.transition_to(Phase::Failed, now);
        self.end_session(now);
        effects.push(self.report(descriptor));
        effects
    }

    fn report(&mut self, descriptor: ErrorDescriptor) -> Effect {
        self.last_error = Some(descriptor.clone());
        Effect::Emit(SessionEvent::Error(descriptor))
    }

    fn end_session(&mut self, now: Instant) {
        self.counter.disarm();
        self.session = None;
        self.started_at = None;
        self.transition_to(Phase::Idle, now);
    }

    fn transition_to(&mut self, phase: Phase, now: Instant) {
        let previous = self.phase;
        self.phase = phase;
        self.phase_entered = now;

        debug!(
            previous = %previous.state().name(),
            current = %phase.state().name(),
            "State transition"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emitted(effects: &[Effect]) -> Vec<SessionEvent> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Emit(event) => Some(event.clone()),
                _ => None,
            })
            .collect()
    }

    fn streaming_machine(interval: u32) -> SessionMachine {
        let now = Instant::now();
        let mut machine = SessionMachine::new(interval);
        machine.apply(MachineInput::StartRequested { supported: true }, now);
        machine.apply(MachineInput::PickerConfirmed, now);
        machine.apply(MachineInput::BroadcastStarted, now);
        assert_eq!(machine.state(), SessionState::Streaming);
        machine
    }

    #[test]
    fn test_start_presents_picker() {
        let mut machine = SessionMachine::new(10);
        let effects = machine.apply(MachineInput::StartRequested { supported: true }, Instant::now());
        assert_eq!(effects, vec![Effect::PresentPicker]);
        assert_eq!(machine.state(), SessionState::RequestingPicker);
        assert_eq!(machine.session(), Some(SessionId(1)));
    }

    #[test]
    fn test_second_start_is_rejected_without_transition() {
        let mut machine = SessionMachine::new(10);
        let now = Instant::now();
        machine.apply(MachineInput::StartRequested { supported: true }, now);
        let effects = machine.apply(MachineInput::StartRequested { supported: true }, now);

        assert_eq!(
            emitted(&effects),
            vec![SessionEvent::Error(ErrorDescriptor::already_active())]
        );
        assert_eq!(machine.state(), SessionState::RequestingPicker);
        assert_eq!(machine.session(), Some(SessionId(1)));
    }

    #[test]
    fn test_unsupported_start_stays_idle() {
        let mut machine = SessionMachine::new(10);
        let effects = machine.apply(MachineInput::StartRequested { supported: false }, Instant::now());
        let events = emitted(&effects);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            SessionEvent::Error(d) if d.code == ErrorCode::OsStartFailed && !d.recoverable
        ));
        assert!(machine.state().is_idle());
        assert_eq!(machine.session(), None);
    }

    #[test]
    fn test_picker_cancel_returns_to_idle() {
        let mut machine = SessionMachine::new(10);
        let now = Instant::now();
        machine.apply(MachineInput::StartRequested { supported: true }, now);
        let effects = machine.apply(MachineInput::PickerCancelled, now);

        assert_eq!(effects, vec![Effect::Emit(SessionEvent::UserCancelled)]);
        assert!(machine.state().is_idle());
        assert_eq!(machine.session(), None);
    }

    #[test]
    fn test_stop_while_idle_is_noop() {
        let mut machine = SessionMachine::new(10);
        let effects = machine.apply(MachineInput::StopRequested, Instant::now());
        assert!(effects.is_empty());
        assert!(machine.state().is_idle());
    }

    #[test]
    fn test_frames_emit_on_cadence() {
        let mut machine = streaming_machine(10);
        let now = Instant::now();
        let mut events = Vec::new();
        for _ in 0..25 {
            events.extend(emitted(&machine.apply(MachineInput::FramesDelivered(1), now)));
        }
        assert_eq!(
            events,
            vec![
                SessionEvent::FrameCountUpdated { frame_count: 10 },
                SessionEvent::FrameCountUpdated { frame_count: 20 },
            ]
        );
        assert_eq!(machine.frame_count(), 25);
    }

    #[test]
    fn test_frame_batch_emits_every_boundary_crossed() {
        let mut machine = streaming_machine(10);
        let now = Instant::now();
        machine.apply(MachineInput::FramesDelivered(4), now);

        let events = emitted(&machine.apply(MachineInput::FramesDelivered(27), now));
        assert_eq!(
            events,
            vec![
                SessionEvent::FrameCountUpdated { frame_count: 10 },
                SessionEvent::FrameCountUpdated { frame_count: 20 },
                SessionEvent::FrameCountUpdated { frame_count: 30 },
            ]
        );
        assert_eq!(machine.frame_count(), 31);
        assert!(machine.apply(MachineInput::FramesDelivered(0), now).is_empty());
    }

    #[test]
    fn test_stop_then_finish_reports_final_count() {
        let mut machine = streaming_machine(10);
        let now = Instant::now();
        for _ in 0..7 {
            machine.apply(MachineInput::FramesDelivered(1), now);
        }

        let effects = machine.apply(MachineInput::StopRequested, now);
        assert_eq!(effects, vec![Effect::StopBroadcast]);
        assert_eq!(machine.state(), SessionState::Stopping);

        // frames racing the stop are not counted
        machine.apply(MachineInput::FramesDelivered(1), now);

        let effects = machine.apply(MachineInput::BroadcastFinished, now);
        assert_eq!(
            effects,
            vec![
                Effect::ReleaseHandle,
                Effect::Emit(SessionEvent::Stopped { frame_count: 7 }),
            ]
        );
        assert!(machine.state().is_idle());
    }

    #[test]
    fn test_stop_during_starting_defers_adapter_stop() {
        let mut machine = SessionMachine::new(10);
        let now = Instant::now();
        machine.apply(MachineInput::StartRequested { supported: true }, now);
        machine.apply(MachineInput::PickerConfirmed, now);

        assert!(machine.apply(MachineInput::StopRequested, now).is_empty());
        assert_eq!(machine.state(), SessionState::Stopping);

        let effects = machine.apply(MachineInput::BroadcastStarted, now);
        assert_eq!(effects, vec![Effect::StopBroadcast]);

        let effects = machine.apply(MachineInput::BroadcastFinished, now);
        assert_eq!(
            emitted(&effects),
            vec![SessionEvent::Stopped { frame_count: 0 }]
        );
    }

    #[test]
    fn test_failure_before_start_is_start_failure() {
        let mut machine = SessionMachine::new(10);
        let now = Instant::now();
        machine.apply(MachineInput::StartRequested { supported: true }, now);
        machine.apply(MachineInput::PickerConfirmed, now);

        let effects = machine.apply(
            MachineInput::BroadcastFailed(Failure::new("rejected", true)),
            now,
        );
        assert_eq!(effects[0], Effect::ReleaseHandle);
        assert!(matches!(
            &effects[1],
            Effect::Emit(SessionEvent::Error(d)) if d.code == ErrorCode::OsStartFailed
        ));
        assert!(machine.state().is_idle());
    }

    #[test]
    fn test_failure_mid_stream_is_runtime_failure() {
        let mut machine = streaming_machine(10);
        let effects = machine.apply(
            MachineInput::BroadcastFailed(Failure::new("extension crashed", true)),
            Instant::now(),
        );
        assert!(matches!(
            &effects[1],
            Effect::Emit(SessionEvent::Error(d))
                if d.code == ErrorCode::OsRuntimeFailure && d.recoverable
        ));
        assert_eq!(
            machine.snapshot().last_error.map(|d| d.code),
            Some(ErrorCode::OsRuntimeFailure)
        );
    }

    #[test]
    fn test_pause_stops_counting() {
        let mut machine = streaming_machine(1);
        let now = Instant::now();
        machine.apply(MachineInput::FramesDelivered(1), now);

        let effects = machine.apply(MachineInput::BroadcastPaused, now);
        assert_eq!(effects, vec![Effect::Emit(SessionEvent::Paused)]);
        assert!(machine.snapshot().paused);
        assert!(machine.apply(MachineInput::FramesDelivered(1), now).is_empty());
        assert!(machine.apply(MachineInput::BroadcastPaused, now).is_empty());

        let effects = machine.apply(MachineInput::BroadcastResumed, now);
        assert_eq!(effects, vec![Effect::Emit(SessionEvent::Resumed)]);
        machine.apply(MachineInput::FramesDelivered(1), now);
        assert_eq!(machine.frame_count(), 2);
    }

    #[test]
    fn test_callback_without_handle_is_violation() {
        let mut machine = SessionMachine::new(10);
        let now = Instant::now();
        machine.apply(MachineInput::StartRequested { supported: true }, now);

        let effects = machine.apply(MachineInput::BroadcastStarted, now);
        assert_eq!(effects.len(), 1);
        assert!(matches!(
            &effects[0],
            Effect::Emit(SessionEvent::Error(d))
                if d.code == ErrorCode::AdapterInvariantViolation && !d.recoverable
        ));
        assert!(machine.state().is_idle());
    }

    #[test]
    fn test_second_picker_result_releases_both_handles() {
        let mut machine = SessionMachine::new(10);
        let now = Instant::now();
        machine.apply(MachineInput::StartRequested { supported: true }, now);
        machine.apply(MachineInput::PickerConfirmed, now);

        let effects = machine.apply(MachineInput::PickerConfirmed, now);
        assert_eq!(effects[0], Effect::RejectHandle);
        assert_eq!(effects[1], Effect::ReleaseHandle);
        assert!(machine.state().is_idle());
    }

    #[test]
    fn test_deadline_fails_waiting_states_only() {
        let mut machine = streaming_machine(10);
        assert!(machine.apply(MachineInput::DeadlineElapsed, Instant::now()).is_empty());

        machine.apply(MachineInput::StopRequested, Instant::now());
        let effects = machine.apply(MachineInput::DeadlineElapsed, Instant::now());
        assert_eq!(effects[0], Effect::ReleaseHandle);
        assert!(matches!(
            &effects[1],
            Effect::Emit(SessionEvent::Error(d)) if d.code == ErrorCode::OsRuntimeFailure
        ));
    }

    #[test]
    fn test_shutdown_while_streaming_stops_and_releases() {
        let mut machine = streaming_machine(10);
        let effects = machine.apply(MachineInput::Shutdown, Instant::now());
        assert_eq!(
            effects,
            vec![
                Effect::StopBroadcast,
                Effect::ReleaseHandle,
                Effect::Emit(SessionEvent::Stopped { frame_count: 0 }),
            ]
        );
        assert!(machine.state().is_idle());
    }

    #[test]
    fn test_new_session_resets_frame_count() {
        let mut machine = streaming_machine(10);
        let now = Instant::now();
        for _ in 0..3 {
            machine.apply(MachineInput::FramesDelivered(1), now);
        }
        machine.apply(MachineInput::BroadcastFinished, now);
        assert_eq!(machine.frame_count(), 3);

        machine.apply(MachineInput::StartRequested { supported: true }, now);
        assert_eq!(machine.frame_count(), 0);
        assert_eq!(machine.session(), Some(SessionId(2)));
    }
}
