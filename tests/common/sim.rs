//! Simulated time, delays and an event recorder

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ak09916::{Clock, EventSink, MagEvent};
use embassy_futures::yield_now;
use embedded_hal_async::delay::DelayNs;

pub const MS: u64 = 1_000_000;

/// Manually driven monotonic clock
#[derive(Debug, Clone, Default)]
pub struct SimClock(Rc<Cell<u64>>);

impl SimClock {
  pub fn now(&self) -> u64 {
    self.0.get()
  }

  pub fn advance(&self, ns: u64) {
    self.0.set(self.0.get() + ns);
  }
}

impl Clock for SimClock {
  fn now_ns(&self) -> u64 {
    self.0.get()
  }
}

/// Timer for the periodic task: yields once, then moves the clock forward.
///
/// `late` is added to the next completed wait only, to simulate a late wakeup.
#[derive(Debug, Clone)]
pub struct SimDelay {
  clock: SimClock,
  late: Rc<Cell<u64>>,
}

impl SimDelay {
  pub fn new(clock: &SimClock) -> Self {
    Self { clock: clock.clone(), late: Rc::new(Cell::new(0)) }
  }

  pub fn wake_late_by(&self, ns: u64) {
    self.late.set(ns);
  }
}

impl DelayNs for SimDelay {
  async fn delay_ns(&mut self, ns: u32) {
    yield_now().await;
    self.clock.advance(ns as u64 + self.late.take());
  }
}

/// Delay used under the transport lock. Yields without moving the clock and
/// keeps a running total of the requested time.
#[derive(Debug, Clone, Default)]
pub struct YieldDelay {
  slept: Rc<Cell<u64>>,
}

impl YieldDelay {
  pub fn slept_ns(&self) -> u64 {
    self.slept.get()
  }

  pub fn reset(&self) {
    self.slept.set(0);
  }
}

impl DelayNs for YieldDelay {
  async fn delay_ns(&mut self, ns: u32) {
    self.slept.set(self.slept.get() + ns as u64);
    yield_now().await;
  }
}

/// Sink that keeps every event
#[derive(Debug, Clone, Default)]
pub struct Recorder(Rc<RefCell<Vec<MagEvent>>>);

impl Recorder {
  pub fn len(&self) -> usize {
    self.0.borrow().len()
  }

  pub fn events(&self) -> Vec<MagEvent> {
    self.0.borrow().clone()
  }

  /// Yield until at least `n` events have been recorded
  pub async fn wait_for(&self, n: usize) {
    while self.len() < n {
      yield_now().await;
    }
  }
}

impl EventSink for Recorder {
  fn push(&mut self, event: MagEvent) {
    self.0.borrow_mut().push(event);
  }
}

/// Give the other side of a `select` a number of polls
pub async fn idle(polls: usize) {
  for _ in 0..polls {
    yield_now().await;
  }
}
