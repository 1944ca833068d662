//! Per-session frame counting.

/// Counts video frames observed while a session is streaming.
///
/// The counter only accepts increments between [`reset`](Self::reset) and
/// [`disarm`](Self::disarm); frame callbacks racing a stop are dropped here.
#[derive(Debug)]
pub struct FrameCounter {
    count: u64,
    armed: bool,
    update_interval: u64,
}

impl FrameCounter {
    /// Create a disarmed counter that reports every `update_interval` frames.
    pub fn new(update_interval: u32) -> Self {
        Self {
            count: 0,
            armed: false,
            update_interval: u64::from(update_interval.max(1)),
        }
    }

    /// Zero the count and start accepting increments.
    pub fn reset(&mut self) {
        self.count = 0;
        self.armed = true;
    }

    /// Stop accepting increments, keeping the final count.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Count one frame. Returns the new count, or `None` if disarmed.
    pub fn increment(&mut self) -> Option<u64> {
        if !self.armed {
            return None;
        }
        self.count += 1;
        Some(self.count)
    }

    /// Current count.
    pub fn current(&self) -> u64 {
        self.count
    }

    /// Whether the current count falls on the update cadence.
    pub fn update_due(&self) -> bool {
        self.count > 0 && self.count % self.update_interval == 0
    }

    /// Whether increments are accepted.
    pub fn is_armed(&self) -> bool {
        self.armed
    }
}
