//! Scriptable in-process broadcast backend.
//!
//! The simulated platform records every call the engine makes and lets the
//! caller fire OS callbacks by hand, in any order.

mod controller;
mod platform;

pub use controller::{ControllerStats, SimController};
pub use platform::SimulatedPlatform;
