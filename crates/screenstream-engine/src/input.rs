//! Inputs the engine reacts to, and the sink that feeds platform callbacks in.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crossbeam_channel::{Sender, TrySendError};
use tracing::{debug, trace, warn};

use screenstream_capture::{FrameSample, PlatformSignal, SignalSink};
use screenstream_ipc::{SessionCommand, SessionId};

/// Everything the session controller reacts to.
///
/// Host commands reach the engine on their own channel; the other variants
/// travel on the platform signal lane.
#[derive(Debug)]
pub enum EngineInput {
    /// A host request.
    Command(SessionCommand),

    /// A platform callback belonging to `session`.
    Signal {
        session: SessionId,
        signal: PlatformSignal,
    },

    /// Video frames for `session` are waiting in its sink.
    FramesPending { session: SessionId },
}

/// Platform-facing sink that tags every callback with its session.
///
/// Video frames are counted here and reported to the engine with at most one
/// [`EngineInput::FramesPending`] marker in flight, so a burst of frames never
/// fills the lane and none are lost.
pub(crate) struct SessionSink {
    session: SessionId,
    tx: Sender<EngineInput>,
    pending_frames: AtomicU64,
    marker_queued: AtomicBool,
}

impl SessionSink {
    pub(crate) fn new(session: SessionId, tx: Sender<EngineInput>) -> Self {
        Self {
            session,
            tx,
            pending_frames: AtomicU64::new(0),
            marker_queued: AtomicBool::new(false),
        }
    }

    pub(crate) fn session(&self) -> SessionId {
        self.session
    }

    /// Take every frame counted since the previous call.
    pub(crate) fn take_frames(&self) -> u64 {
        // Clear the marker first so a frame racing the swap posts a new one.
        self.marker_queued.store(false, Ordering::Release);
        self.pending_frames.swap(0, Ordering::AcqRel)
    }

    fn queue_frame(&self, sample: &FrameSample) {
        if !sample.is_video() {
            trace!(session = %self.session, kind = ?sample.kind, "Ignoring non-video sample");
            return;
        }

        let pending = self.pending_frames.fetch_add(1, Ordering::AcqRel) + 1;
        if sample.sequence <= 3 || sample.sequence % 300 == 0 {
            trace!(
                session = %self.session,
                sequence = sample.sequence,
                pts_ms = sample.pts_ms(),
                pending,
                "Frame queued"
            );
        }

        if self.marker_queued.swap(true, Ordering::AcqRel) {
            return;
        }

        match self.tx.try_send(EngineInput::FramesPending {
            session: self.session,
        }) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                // The next frame retries; lifecycle signals collect the count too.
                self.marker_queued.store(false, Ordering::Release);
                debug!(session = %self.session, pending, "Input lane full, frame report deferred");
            }
            Err(TrySendError::Disconnected(_)) => {
                trace!(session = %self.session, "Engine stopped, frame not reported");
            }
        }
    }
}

impl SignalSink for SessionSink {
    fn deliver(&self, signal: PlatformSignal) {
        if let PlatformSignal::FrameDelivered(sample) = &signal {
            self.queue_frame(sample);
            return;
        }

        let input = EngineInput::Signal {
            session: self.session,
            signal,
        };
        if let Err(e) = self.tx.send(input) {
            warn!(session = %self.session, "Engine stopped, dropping platform signal");
            if let EngineInput::Signal {
                signal: PlatformSignal::PickerConfirmed(handle),
                ..
            } = e.into_inner()
            {
                handle.release();
            }
        }
    }
}
