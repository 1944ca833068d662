//! Broadcast session controller.
//!
//! This crate owns the single screen-broadcast session: it mediates host
//! start/stop requests, consumes the platform's delegate callbacks, counts
//! delivered frames and streams typed events back to the host.

mod adapter;
mod controller;
mod emitter;
mod error;
mod frame_counter;
mod input;
mod machine;
mod orchestrator;
mod picker;

pub use adapter::{BroadcastControllerAdapter, Translated};
pub use controller::SessionController;
pub use emitter::EventEmitter;
pub use error::{EngineError, EngineResult};
pub use frame_counter::FrameCounter;
pub use input::EngineInput;
pub use machine::{Effect, Failure, MachineInput, SessionMachine};
pub use orchestrator::{create_engine, spawn_engine, Engine, EngineHandle};
pub use picker::ActivityPickerCoordinator;
