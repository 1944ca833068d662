//! Host driver for the broadcast session controller.
//!
//! Runs the engine against the simulated platform, plays one scripted
//! session and prints every event as a JSON line.

mod script;

use std::path::Path;
use std::sync::Arc;
use std::{env, fs, thread};

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use screenstream_capture::sim::SimulatedPlatform;
use screenstream_capture::BroadcastPlatform;
use screenstream_engine::spawn_engine;
use screenstream_ipc::{event_channel, SessionConfig};

/// Initialize logging.
fn init_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "screenstream=debug,screenstream_engine=debug,screenstream_capture=debug,screenstream_ipc=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Read a JSON session config, falling back to defaults for missing fields.
fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };

    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: SessionConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    init_logging();

    let config_path = env::args().nth(1);
    let config = load_config(config_path.as_deref().map(Path::new))?;
    info!(?config, "Screenstream starting");

    let platform = SimulatedPlatform::new();
    if !platform.is_supported() {
        warn!("Screen broadcast not supported, the session will be rejected");
    }

    let (event_tx, event_rx) = event_channel();
    let (handle, engine_thread) = spawn_engine(config, Arc::new(platform.clone()), event_tx)?;

    let script_handle = handle.clone();
    let script_thread = thread::spawn(move || script::run(&platform, &script_handle));

    // The event channel is a rendezvous, so keep receiving until the session ends.
    for event in event_rx.iter() {
        info!(kind = ?event.kind(), "Session event");
        println!("{}", serde_json::to_string(&event)?);
        if event.is_terminal() {
            break;
        }
    }

    script_thread
        .join()
        .map_err(|_| anyhow::anyhow!("Script thread panicked"))??;

    let snapshot = handle.snapshot();
    info!(state = snapshot.state.name(), frames = snapshot.frame_count, "Session finished");

    handle.shutdown()?;
    engine_thread
        .join()
        .map_err(|_| anyhow::anyhow!("Engine thread panicked"))?;

    info!("Screenstream stopped");
    Ok(())
}
