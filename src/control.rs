//! Stream control: enable/disable, sampling interval and reset lockout.
//!
//! Every state-changing call here holds the control lock for its whole
//! duration, so an interval change can never interleave with an enable
//! transition and a self-test cannot double-arm the periodic task.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::{delay::DelayNs, i2c::*};

use crate::{clock::Clock, mode::Mode, rw::LinkState, Ak09916, Error};

impl<I, D, C, M, E> Ak09916<I, D, C, M>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
  C: Clock,
  M: RawMutex,
{
  pub fn is_enabled(&self) -> bool {
    self.state.is_enabled()
  }

  /// Start or stop the sample stream.
  ///
  /// Enabling resets the jitter baseline, programs single-measurement mode and
  /// arms the task; the first sample arrives one interval later. Disabling
  /// waits for any in-flight cycle, then powers the sensor down. Repeating the
  /// current state is a no-op.
  ///
  /// While the link is locked out only the requested state is recorded; it is
  /// applied by [`recover`](Self::recover).
  pub async fn set_enabled(&self, enable: bool) -> Result<(), Error<E>> {
    let _control = self.control.lock().await;
    info!("enable = {}", enable);

    if self.state.link.state() == LinkState::Locked {
      info!("link locked, deferring enable = {}", enable);
      self.state.set_enabled(enable);
      return Ok(());
    }

    match (self.state.is_enabled(), enable) {
      (false, true) => {
        self.state.reset_baseline();
        self.port().await.set_mode(Mode::Single).await?;
        self.state.set_enabled(true);
        self.scheduler.arm();
      }
      (true, false) => {
        self.scheduler.disarm().await;
        self.state.set_enabled(false);
        self.port().await.power_down().await?;
      }
      _ => {}
    }
    Ok(())
  }

  /// Current sampling interval in nanoseconds.
  pub fn delay_ns(&self) -> u64 {
    self.state.delay_ns()
  }

  /// Set the sampling interval, clamped to
  /// [`MIN_DELAY_NS`](crate::MIN_DELAY_NS)..=[`MAX_DELAY_NS`](crate::MAX_DELAY_NS).
  ///
  /// Takes effect from the next cycle. Returns the interval actually applied.
  pub async fn set_delay_ns(&self, ns: u64) -> u64 {
    let _control = self.control.lock().await;
    let applied = self.state.set_delay_ns(ns);
    info!("poll delay = {}", applied);
    applied
  }

  /// Last sample produced by the stream or by a one-shot read.
  pub fn last_sample(&self) -> crate::Sample {
    self.state.last()
  }

  /// Timestamp of the last real streamed sample since the stream (re)started.
  pub fn last_timestamp_ns(&self) -> Option<u64> {
    self.state.baseline()
  }

  pub fn link_state(&self) -> LinkState {
    self.state.link.state()
  }

  /// Enter lockout ahead of an external reset of the sensor.
  ///
  /// Every transport call fails with [`Error::LockedOut`] from here on. The
  /// periodic task is stopped but the enabled flag is kept. Returns that flag.
  pub async fn lock_out(&self) -> bool {
    info!("power reset start");
    self.state.link.set(LinkState::Locked);

    let _control = self.control.lock().await;
    let enabled = self.state.is_enabled();
    if enabled {
      self.scheduler.disarm().await;
    }
    info!("power reset end");
    enabled
  }

  /// Leave lockout after the external reset and restore the requested state.
  ///
  /// Returns the enabled flag that was applied.
  pub async fn recover(&self) -> Result<bool, Error<E>> {
    let _control = self.control.lock().await;
    info!("sw reset start");
    self.state.link.set(LinkState::Normal);
    self.state.reset_baseline();

    let enabled = self.state.is_enabled();
    if enabled {
      info!("was enabled, re-arming");
      let programmed = self.port().await.set_mode(Mode::Single).await;
      self.scheduler.arm();
      programmed?;
    } else {
      info!("was disabled, powering down");
      self.port().await.power_down().await?;
    }
    info!("sw reset end");
    Ok(enabled)
  }
}
