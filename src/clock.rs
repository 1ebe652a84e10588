//! Time sources for scheduling, in seconds since the output started.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub trait AudioClock: Send + Sync {
    /// Monotonic seconds.
    fn now(&self) -> f64;
}

/// Advanced by the output callback as frames are rendered.
#[derive(Debug, Clone)]
pub struct StreamClock {
    frames: Arc<AtomicU64>,
    sample_rate: u32,
}

impl StreamClock {
    pub fn new(sample_rate: u32) -> Self {
        StreamClock {
            frames: Arc::new(AtomicU64::new(0)),
            sample_rate: sample_rate.max(1),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Returns the frame index the advanced block starts at.
    pub fn advance(&self, frames: u64) -> u64 {
        self.frames.fetch_add(frames, Ordering::AcqRel)
    }
}

impl AudioClock for StreamClock {
    fn now(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Settable clock for headless use and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        ManualClock { bits: AtomicU64::new(start.to_bits()) }
    }

    /// Ignored if it would move time backwards.
    pub fn set(&self, seconds: f64) {
        let _ = self.bits.fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
            (seconds > f64::from_bits(current)).then(|| seconds.to_bits())
        });
    }

    pub fn advance(&self, seconds: f64) {
        if seconds > 0.0 {
            self.set(self.now() + seconds);
        }
    }
}

impl AudioClock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}
