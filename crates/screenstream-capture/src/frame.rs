//! Sample notifications from the broadcast extension.

use std::time::{Duration, Instant};

/// Kind of sample buffer delivered by the broadcast extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    /// Screen video frame.
    Video,

    /// Audio produced by the captured app.
    AudioApp,

    /// Microphone audio.
    AudioMic,
}

/// Notification that one sample was captured. The pixel data itself stays
/// with the capture framework.
#[derive(Debug, Clone, Copy)]
pub struct FrameSample {
    pub kind: SampleKind,

    /// Sequence number assigned by the source, starting at 1 per stream.
    pub sequence: u64,

    /// Offset from the start of the stream.
    pub pts: Duration,
}

impl FrameSample {
    pub fn new(kind: SampleKind, sequence: u64, pts: Duration) -> Self {
        Self {
            kind,
            sequence,
            pts,
        }
    }

    /// Sample captured now, stamped relative to `stream_start`.
    pub fn captured(kind: SampleKind, stream_start: Instant, sequence: u64) -> Self {
        Self::new(kind, sequence, stream_start.elapsed())
    }

    /// Video frame captured now.
    pub fn video(stream_start: Instant, sequence: u64) -> Self {
        Self::captured(SampleKind::Video, stream_start, sequence)
    }

    pub fn is_video(&self) -> bool {
        self.kind == SampleKind::Video
    }

    /// Presentation offset in whole milliseconds.
    pub fn pts_ms(&self) -> u64 {
        self.pts.as_millis() as u64
    }
}
