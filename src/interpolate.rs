//! Jitter compensation for the periodic stream.
//!
//! The executor may run a cycle late. Consumers downstream assume a fixed
//! cadence, so when the real gap between two readings grows past the tolerance
//! band the missing slots are backfilled with copies of the newest reading at
//! evenly spaced timestamps.

use crate::{MagEvent, Sample};

/// Gap threshold as a ratio `NUM / DEN` of the nominal interval (1.8×).
pub const JITTER_NUM: u64 = 18;
pub const JITTER_DEN: u64 = 10;
/// Synthesis stops once the next slot is within `interval / CATCH_UP_DIV` of the real timestamp.
pub const CATCH_UP_DIV: u64 = 2;

/// Tracks the timestamp of the last real reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Interpolator {
  baseline: Option<u64>,
}

impl Interpolator {
  pub const fn new() -> Self {
    Self { baseline: None }
  }

  /// Forget the baseline; the next reading is emitted on its own.
  pub fn reset(&mut self) {
    self.baseline = None;
  }

  pub fn baseline(&self) -> Option<u64> {
    self.baseline
  }

  /// Accept a real reading and return the events to emit for it, in order.
  ///
  /// The baseline moves to `timestamp_ns` immediately.
  pub fn feed(&mut self, timestamp_ns: u64, sample: Sample, interval_ns: u64) -> Backfill {
    let previous = self.baseline.replace(timestamp_ns);
    let mut fill = Backfill { next: 0, until: 0, step: interval_ns, sample, real: Some(timestamp_ns) };

    let Some(previous) = previous else {
      return fill;
    };
    if interval_ns == 0 {
      return fill;
    }

    let gap = timestamp_ns.saturating_sub(previous);
    if gap.saturating_mul(JITTER_DEN) > interval_ns.saturating_mul(JITTER_NUM) {
      fill.next = previous.saturating_add(interval_ns);
      fill.until = timestamp_ns.saturating_sub(interval_ns / CATCH_UP_DIV);
    }
    fill
  }
}

/// Synthetic frames (if any) followed by the real one.
#[derive(Debug, Clone)]
pub struct Backfill {
  next: u64,
  until: u64,
  step: u64,
  sample: Sample,
  real: Option<u64>,
}

impl Iterator for Backfill {
  type Item = MagEvent;

  fn next(&mut self) -> Option<MagEvent> {
    if self.next < self.until {
      let timestamp_ns = self.next;
      self.next = self.next.saturating_add(self.step);
      return Some(MagEvent { sample: self.sample, timestamp_ns, synthetic: true });
    }
    self.real.take().map(|timestamp_ns| MagEvent { sample: self.sample, timestamp_ns, synthetic: false })
  }
}
