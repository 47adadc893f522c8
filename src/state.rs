use core::{
  cell::Cell,
  sync::atomic::{AtomicBool, AtomicU32, Ordering},
};

use embassy_sync::blocking_mutex::{raw::RawMutex, Mutex};

use crate::{
  defs::{MAX_DELAY_NS, MIN_DELAY_NS},
  interpolate::{Backfill, Interpolator},
  rw::Link,
  Sample,
};

/// Device state shared between the control surface and the periodic task.
///
/// `enabled` and `delay_ns` are read lock-free by the task but only written
/// with the control lock held.
pub(crate) struct State<M: RawMutex> {
  pub(crate) link: Link,
  enabled: AtomicBool,
  delay_ns: AtomicU32,
  interp: Mutex<M, Cell<Interpolator>>,
  last: Mutex<M, Cell<Sample>>,
}

impl<M: RawMutex> State<M> {
  pub(crate) fn new(delay_ns: u64) -> Self {
    Self {
      link: Link::new(),
      enabled: AtomicBool::new(false),
      delay_ns: AtomicU32::new(clamp_delay(delay_ns) as u32),
      interp: Mutex::new(Cell::new(Interpolator::new())),
      last: Mutex::new(Cell::new(Sample::default())),
    }
  }

  pub(crate) fn is_enabled(&self) -> bool {
    self.enabled.load(Ordering::Acquire)
  }

  pub(crate) fn set_enabled(&self, on: bool) {
    self.enabled.store(on, Ordering::Release);
  }

  pub(crate) fn delay_ns(&self) -> u64 {
    self.delay_ns.load(Ordering::Relaxed) as u64
  }

  /// Store a clamped interval; returns the value actually applied.
  pub(crate) fn set_delay_ns(&self, ns: u64) -> u64 {
    let ns = clamp_delay(ns);
    self.delay_ns.store(ns as u32, Ordering::Relaxed);
    ns
  }

  pub(crate) fn reset_baseline(&self) {
    self.interp.lock(|c| c.set(Interpolator::new()));
  }

  pub(crate) fn baseline(&self) -> Option<u64> {
    self.interp.lock(|c| c.get().baseline())
  }

  pub(crate) fn feed(&self, timestamp_ns: u64, sample: Sample, interval_ns: u64) -> Backfill {
    self.interp.lock(|c| {
      let mut i = c.get();
      let fill = i.feed(timestamp_ns, sample, interval_ns);
      c.set(i);
      fill
    })
  }

  pub(crate) fn last(&self) -> Sample {
    self.last.lock(|c| c.get())
  }

  pub(crate) fn set_last(&self, s: Sample) {
    self.last.lock(|c| c.set(s));
  }
}

pub(crate) fn clamp_delay(ns: u64) -> u64 {
  if ns > MAX_DELAY_NS {
    debug!("delay {} above max, clamped", ns);
  } else if ns < MIN_DELAY_NS {
    debug!("delay {} below min, clamped", ns);
  }
  ns.clamp(MIN_DELAY_NS, MAX_DELAY_NS)
}
