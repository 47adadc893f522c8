//! Periodic sampling task.
//!
//! [`Ak09916::run`] is a long-lived future the application spawns once. It
//! parks until the stream is enabled, then sleeps for the configured interval,
//! takes a measurement and hands it to the jitter compensation, over and over.
//! Each sleep races a command signal, so disarming interrupts the wait but
//! never a measurement in progress. The disarming side blocks on a second
//! signal until the task has parked again.
//!
//! ```no_run
//! # async fn example<I, D, C, M>(mag: &ak09916::Ak09916<I, D, C, M>, mut delay: impl embedded_hal_async::delay::DelayNs)
//! # where I: embedded_hal_async::i2c::I2c, D: embedded_hal_async::delay::DelayNs, C: ak09916::Clock,
//! #   M: embassy_sync::blocking_mutex::raw::RawMutex {
//! let mut queue: heapless::Deque<ak09916::MagEvent, 32> = heapless::Deque::new();
//! mag.run(&mut delay, &mut queue).await
//! # }
//! ```

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_futures::select::{select, Either};
use embassy_sync::{blocking_mutex::raw::RawMutex, signal::Signal};
use embedded_hal_async::{delay::DelayNs, i2c::*};

use crate::{clock::Clock, rw::LinkState, Ak09916, MagEvent};

/// Destination for streamed readings.
pub trait EventSink {
  fn push(&mut self, event: MagEvent);
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
  fn push(&mut self, event: MagEvent) {
    (**self).push(event)
  }
}

/// Bounded queue; the oldest event is dropped when full.
impl<const N: usize> EventSink for heapless::Deque<MagEvent, N> {
  fn push(&mut self, event: MagEvent) {
    if self.is_full() {
      let _ = self.pop_front();
    }
    let _ = self.push_back(event);
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
  Arm,
  Disarm,
}

pub(crate) struct Scheduler<M: RawMutex> {
  command: Signal<M, Command>,
  parked: Signal<M, ()>,
  armed: AtomicBool,
  running: AtomicBool,
}

impl<M: RawMutex> Scheduler<M> {
  pub(crate) const fn new() -> Self {
    Self { command: Signal::new(), parked: Signal::new(), armed: AtomicBool::new(false), running: AtomicBool::new(false) }
  }

  pub(crate) fn is_armed(&self) -> bool {
    self.armed.load(Ordering::Acquire)
  }

  /// First cycle fires one interval from now.
  pub(crate) fn arm(&self) {
    self.armed.store(true, Ordering::Release);
    self.command.signal(Command::Arm);
  }

  /// Stop the task and wait until it has parked.
  ///
  /// A cycle already in flight runs to completion first; nothing is emitted
  /// after this returns.
  pub(crate) async fn disarm(&self) {
    if !self.armed.swap(false, Ordering::AcqRel) {
      return;
    }
    self.parked.reset();
    self.command.signal(Command::Disarm);
    if self.running.load(Ordering::Acquire) {
      self.parked.wait().await;
    }
  }
}

/// Clears the `running` flag when the task future is dropped and releases a
/// disarm that is still waiting for the task to park.
struct Running<'a, M: RawMutex>(&'a Scheduler<M>);

impl<M: RawMutex> Drop for Running<'_, M> {
  fn drop(&mut self) {
    self.0.running.store(false, Ordering::Release);
    self.0.parked.signal(());
  }
}

impl<I, D, C, M, E> Ak09916<I, D, C, M>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
  C: Clock,
  M: RawMutex,
{
  /// Drive the sample stream. Never returns; drop the future to stop it.
  ///
  /// `delay` is the task's own timer and must not be the one given to
  /// [`new`](Self::new), which stays behind the transport lock. The future
  /// has to be polled, or dropped, for [`set_enabled(false)`](Self::set_enabled)
  /// to complete while the stream is running.
  pub async fn run(&self, delay: &mut impl DelayNs, sink: &mut impl EventSink) -> ! {
    let sched = &self.scheduler;
    sched.running.store(true, Ordering::Release);
    let _running = Running(sched);

    loop {
      if sched.command.wait().await == Command::Disarm {
        sched.parked.signal(());
        continue;
      }
      debug!("stream armed");

      loop {
        let interval = self.state.delay_ns();
        match select(sched.command.wait(), delay.delay_ns(interval as u32)).await {
          Either::First(Command::Disarm) => break,
          Either::First(Command::Arm) => continue,
          Either::Second(()) => self.cycle(sink).await,
        }
      }

      debug!("stream parked");
      sched.parked.signal(());
    }
  }

  /// One measurement. Failures are logged and dropped; the next cycle runs regardless.
  async fn cycle(&self, sink: &mut impl EventSink) {
    if self.state.link.state() == LinkState::Locked {
      debug!("cycle skipped, link locked");
      return;
    }

    let interval = self.state.delay_ns();
    let now = self.clock.now_ns();
    let result = self.port().await.acquire().await;

    match result {
      Ok(sample) => {
        for event in self.state.feed(now, sample, interval) {
          sink.push(event);
        }
        self.state.set_last(sample);
      }
      Err(_) => warn!("cycle at {} dropped", now),
    }
  }
}
