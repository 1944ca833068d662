//! Shared harness for session controller tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use screenstream_capture::sim::SimulatedPlatform;
use screenstream_engine::{EngineInput, SessionController};
use screenstream_ipc::{SessionCommand, SessionConfig, SessionEvent, SessionState};

/// Drives a [`SessionController`] synchronously against the simulated platform.
pub struct Harness {
    pub controller: SessionController,
    pub platform: SimulatedPlatform,
    input_rx: Receiver<EngineInput>,
    events: Receiver<SessionEvent>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self::with_platform(config, SimulatedPlatform::new())
    }

    pub fn with_platform(config: SessionConfig, platform: SimulatedPlatform) -> Self {
        let (input_tx, input_rx) = crossbeam_channel::bounded(config.input_channel_capacity);
        let (event_tx, events) = crossbeam_channel::unbounded();
        let controller =
            SessionController::new(config, Arc::new(platform.clone()), input_tx, event_tx);

        Self {
            controller,
            platform,
            input_rx,
            events,
        }
    }

    /// Issue a host command and process everything it triggers.
    pub fn command(&mut self, command: SessionCommand) -> bool {
        let keep_running = self.controller.handle(EngineInput::Command(command));
        self.pump();
        keep_running
    }

    pub fn start(&mut self) {
        self.command(SessionCommand::StartStreaming);
    }

    pub fn stop(&mut self) {
        self.command(SessionCommand::StopStreaming);
    }

    /// Act as the OS, then process the callbacks it produced.
    pub fn os<R>(&mut self, f: impl FnOnce(&SimulatedPlatform) -> R) -> R {
        let result = f(&self.platform);
        self.pump();
        result
    }

    /// Start a session and bring it to `Streaming`. Returns the controller id.
    pub fn start_streaming(&mut self) -> u64 {
        self.start();
        let id = self.os(|p| p.confirm_picker()).expect("picker was presented");
        self.os(|p| p.broadcast_started());
        assert_eq!(self.state(), SessionState::Streaming);
        id
    }

    pub fn pump(&mut self) {
        while let Ok(input) = self.input_rx.try_recv() {
            self.controller.handle(input);
        }
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.try_iter().collect()
    }

    pub fn state(&self) -> SessionState {
        self.controller.snapshot().state
    }

    pub fn releases(&self, id: u64) -> u32 {
        self.platform
            .controller(id)
            .map(|stats| stats.releases())
            .unwrap_or(0)
    }
}

/// Poll `condition` until it holds or two seconds pass.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
