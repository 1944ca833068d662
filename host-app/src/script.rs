//! Scripted OS behaviour for one broadcast session.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use tracing::{debug, info};

use screenstream_capture::sim::SimulatedPlatform;
use screenstream_engine::EngineHandle;

/// Frames delivered before the host asks to stop.
const SCRIPT_FRAMES: u64 = 120;

/// Pause between frames, roughly 60 fps.
const FRAME_PERIOD: Duration = Duration::from_millis(16);

const PICKER_WAIT: Duration = Duration::from_secs(2);

/// Start a session, accept the picker, stream some frames and stop.
pub fn run(platform: &SimulatedPlatform, handle: &EngineHandle) -> Result<()> {
    handle.start_streaming()?;

    let deadline = Instant::now() + PICKER_WAIT;
    while platform.presentations() == 0 {
        if Instant::now() >= deadline {
            bail!("Picker was never presented");
        }
        thread::sleep(Duration::from_millis(5));
    }

    let Some(controller) = platform.confirm_picker() else {
        bail!("Picker has no session to confirm");
    };
    info!(controller, "User picked the broadcast extension");
    platform.broadcast_started();

    for _ in 0..SCRIPT_FRAMES {
        platform.deliver_frames(1);
        thread::sleep(FRAME_PERIOD);
    }

    debug!("Requesting stop");
    handle.stop_streaming()?;
    platform.broadcast_finished();

    if let Some(stats) = platform.controller(controller) {
        debug!(
            starts = stats.starts(),
            finishes = stats.finishes(),
            "Controller calls"
        );
    }
    Ok(())
}
