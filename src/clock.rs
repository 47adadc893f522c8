/// Monotonic time source used to stamp streamed samples.
pub trait Clock {
  /// Nanoseconds since an arbitrary fixed origin. Must never go backwards.
  fn now_ns(&self) -> u64;
}

impl<C: Clock> Clock for &C {
  fn now_ns(&self) -> u64 {
    (**self).now_ns()
  }
}

/// [`Clock`] backed by the `embassy-time` driver.
#[cfg(feature = "embassy-time")]
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

#[cfg(feature = "embassy-time")]
impl Clock for EmbassyClock {
  fn now_ns(&self) -> u64 {
    ticks_to_ns(embassy_time::Instant::now().as_ticks(), embassy_time::TICK_HZ)
  }
}

#[cfg(feature = "embassy-time")]
fn ticks_to_ns(ticks: u64, tick_hz: u64) -> u64 {
  (ticks as u128 * 1_000_000_000 / tick_hz as u128) as u64
}
