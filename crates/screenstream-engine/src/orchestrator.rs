//! Engine actor: the thread that owns the session controller.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{select, Receiver, Sender, TrySendError};
use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};

use screenstream_capture::{BroadcastPlatform, PlatformSignal};
use screenstream_ipc::{
    command_channel, ConfigError, SessionCommand, SessionConfig, SessionEvent, SessionSnapshot,
};

use crate::adapter::BroadcastControllerAdapter;
use crate::controller::SessionController;
use crate::error::{EngineError, EngineResult};
use crate::input::EngineInput;

/// How often the loop wakes to check the watchdog when idle.
const WATCHDOG_TICK: Duration = Duration::from_millis(100);

/// The session engine. Runs on its own thread via [`Engine::run`].
pub struct Engine {
    command_rx: Receiver<SessionCommand>,
    signal_rx: Receiver<EngineInput>,
    controller: SessionController,
}

impl Engine {
    /// Run the engine (blocking) until a `Shutdown` command arrives or every
    /// [`EngineHandle`] is dropped.
    #[instrument(name = "engine_run", skip(self))]
    pub fn run(&mut self) {
        info!("Engine starting");

        loop {
            let keep_running = select! {
                recv(self.command_rx) -> msg => match msg {
                    Ok(command) => self.controller.handle(EngineInput::Command(command)),
                    Err(_) => {
                        info!("Command channel disconnected, shutting down");
                        self.controller
                            .handle(EngineInput::Command(SessionCommand::Shutdown));
                        false
                    }
                },
                recv(self.signal_rx) -> msg => match msg {
                    Ok(input) => self.controller.handle(input),
                    Err(_) => {
                        warn!("Signal lane disconnected, shutting down");
                        self.controller
                            .handle(EngineInput::Command(SessionCommand::Shutdown));
                        false
                    }
                },
                default(WATCHDOG_TICK) => true,
            };

            if !keep_running {
                break;
            }
            self.controller.check_deadline(Instant::now());
        }

        self.release_queued();
        info!("Engine stopped");
    }

    /// Release controller handles still queued on the signal lane.
    fn release_queued(&mut self) {
        for input in self.signal_rx.try_iter() {
            if let EngineInput::Signal {
                session,
                signal: PlatformSignal::PickerConfirmed(handle),
            } = input
            {
                debug!(%session, "Releasing controller handle queued after shutdown");
                BroadcastControllerAdapter::discard(handle);
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.release_queued();
    }
}

/// Host-side handle: issues commands and reads the session snapshot.
///
/// Commands never block. Dropping every handle shuts the engine down.
#[derive(Clone)]
pub struct EngineHandle {
    command_tx: Sender<SessionCommand>,
    snapshot: Arc<RwLock<SessionSnapshot>>,
}

impl EngineHandle {
    /// Request a new broadcast session. The outcome arrives as events.
    pub fn start_streaming(&self) -> EngineResult<()> {
        self.send(SessionCommand::StartStreaming)
    }

    /// Request the current session to stop. A no-op while idle.
    pub fn stop_streaming(&self) -> EngineResult<()> {
        self.send(SessionCommand::StopStreaming)
    }

    /// Stop any active session and end the engine loop.
    pub fn shutdown(&self) -> EngineResult<()> {
        self.send(SessionCommand::Shutdown)
    }

    /// Send a raw command.
    pub fn send(&self, command: SessionCommand) -> EngineResult<()> {
        self.command_tx.try_send(command).map_err(|e| match e {
            TrySendError::Full(command) => {
                warn!(?command, "Command channel full, rejecting command");
                EngineError::LaneFull
            }
            TrySendError::Disconnected(_) => EngineError::EngineStopped,
        })
    }

    /// Atomic snapshot of the session.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.read().clone()
    }

    /// Whether the broadcast is live.
    pub fn is_streaming(&self) -> bool {
        self.snapshot.read().is_streaming()
    }

    /// Frames counted in the current or most recent session.
    pub fn frame_count(&self) -> u64 {
        self.snapshot.read().frame_count
    }
}

/// Create an engine and the handle that drives it.
pub fn create_engine(
    config: SessionConfig,
    platform: Arc<dyn BroadcastPlatform>,
    event_tx: Sender<SessionEvent>,
) -> Result<(Engine, EngineHandle), ConfigError> {
    config.validate()?;

    let (command_tx, command_rx) = command_channel();
    let (signal_tx, signal_rx) = crossbeam_channel::bounded(config.input_channel_capacity);
    let controller = SessionController::new(config, platform, signal_tx, event_tx);
    let handle = EngineHandle {
        command_tx,
        snapshot: controller.snapshot_handle(),
    };

    Ok((
        Engine {
            command_rx,
            signal_rx,
            controller,
        },
        handle,
    ))
}

/// Create an engine and run it on a background thread.
pub fn spawn_engine(
    config: SessionConfig,
    platform: Arc<dyn BroadcastPlatform>,
    event_tx: Sender<SessionEvent>,
) -> Result<(EngineHandle, JoinHandle<()>), ConfigError> {
    let (mut engine, handle) = create_engine(config, platform, event_tx)?;
    let thread = thread::spawn(move || engine.run());
    Ok((handle, thread))
}
