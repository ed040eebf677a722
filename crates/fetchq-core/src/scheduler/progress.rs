//! Progress reporting for the active item (bytes done, rate, ETA).
//!
//! Transfers feed raw byte counts into a `ProgressReporter`. Every count
//! reaches the observer as `FileProgress`; only the rate goes through a
//! `SpeedMeter` and is throttled.

use std::time::{Duration, Instant};

use crate::events::{EngineEvent, Observer};

/// Snapshot of progress for the active item.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub bytes_downloaded: u64,
    /// Total file size in bytes; 0 when the origin did not say.
    pub total_bytes: u64,
    /// Most recent rate emitted by the speed meter.
    pub rate_bytes_per_sec: f64,
}

impl ProgressSnapshot {
    /// Fraction complete in [0.0, 1.0]; `None` when the size is unknown.
    pub fn fraction(&self) -> Option<f64> {
        if self.total_bytes == 0 {
            return None;
        }
        Some((self.bytes_downloaded as f64 / self.total_bytes as f64).min(1.0))
    }

    /// Estimated seconds remaining (None if rate is 0 or the size is unknown).
    pub fn eta_secs(&self) -> Option<f64> {
        if self.total_bytes == 0 {
            return None;
        }
        let remaining = self.total_bytes.saturating_sub(self.bytes_downloaded);
        if remaining == 0 {
            return Some(0.0);
        }
        if self.rate_bytes_per_sec <= 0.0 {
            return None;
        }
        Some(remaining as f64 / self.rate_bytes_per_sec)
    }
}

/// Rate over the window since the last emission, emitted at most once per `interval`.
#[derive(Debug, Clone)]
pub struct SpeedMeter {
    interval: Duration,
    last: Option<(Instant, u64)>,
}

impl SpeedMeter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Feed the cumulative byte count observed at `now`.
    ///
    /// The first call only sets the baseline. Later calls return
    /// `(bytes_now - bytes_then) / (now - then)` once `interval` has passed
    /// since the previous emission, and move the baseline forward.
    pub fn update(&mut self, bytes_now: u64, now: Instant) -> Option<f64> {
        let Some((then, bytes_then)) = self.last else {
            self.last = Some((now, bytes_now));
            return None;
        };
        let elapsed = now.saturating_duration_since(then);
        if elapsed < self.interval || elapsed.is_zero() {
            return None;
        }
        let rate = bytes_now.saturating_sub(bytes_then) as f64 / elapsed.as_secs_f64();
        self.last = Some((now, bytes_now));
        Some(rate)
    }
}

/// Per-item progress state that pushes `FileProgress` and `Speed` events.
pub struct ProgressReporter<'a> {
    observer: &'a dyn Observer,
    meter: SpeedMeter,
    bytes: u64,
    total: u64,
    rate: f64,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(observer: &'a dyn Observer, total: u64, speed_interval: Duration) -> Self {
        let mut meter = SpeedMeter::new(speed_interval);
        meter.update(0, Instant::now());
        Self {
            observer,
            meter,
            bytes: 0,
            total,
            rate: 0.0,
        }
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            bytes_downloaded: self.bytes,
            total_bytes: self.total,
            rate_bytes_per_sec: self.rate,
        }
    }

    /// Count `delta` more bytes and report them. `Speed` is emitted only
    /// when the meter's interval has passed.
    pub fn add(&mut self, delta: u64) {
        self.bytes += delta;
        if let Some(rate) = self.meter.update(self.bytes, Instant::now()) {
            self.rate = rate;
            self.observer.notify(EngineEvent::Speed {
                bytes_per_sec: rate,
            });
        }
        self.observer
            .notify(EngineEvent::FileProgress(self.snapshot()));
    }
}
