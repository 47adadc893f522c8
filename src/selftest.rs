//! Factory self-test.
//!
//! The self-test mode drives an internal field through the sensing elements;
//! a healthy part reports it inside fixed per-axis windows. The run is retried
//! a bounded number of times before the part is declared bad, then a normal
//! single-shot conversion is checked against the ADC range.

use core::ops::RangeInclusive;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::{delay::DelayNs, i2c::*};

use crate::{clock::Clock, defs::*, measure::St1, mode::Mode, rw::Port, Ak09916, Error, Sample};

/// Accepted self-test response on X, in LSB.
pub const SELF_TEST_X: RangeInclusive<i16> = -200..=200;
/// Accepted self-test response on Y, in LSB.
pub const SELF_TEST_Y: RangeInclusive<i16> = -200..=200;
/// Accepted self-test response on Z, in LSB.
pub const SELF_TEST_Z: RangeInclusive<i16> = -1000..=-200;

/// Outcome of [`Ak09916::run_self_test`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SelfTestReport {
  /// Sensitivity adjustment bytes look programmed.
  pub calibration_ok: bool,
  /// Self-test response was inside the windows on every axis.
  pub passed: bool,
  /// Raw self-test response of the last attempt (not remapped).
  pub response: Sample,
  /// CNTL2 accepted power-down and could be read back on the last attempt.
  pub cntl_ok: bool,
  /// A normal conversion after the test succeeded and stayed inside ±6500.
  pub adc_ok: bool,
  /// That conversion, remapped. Zero if none succeeded.
  pub adc: Sample,
}

impl SelfTestReport {
  /// Flat factory-tool layout: status, result, sx, sy, sz, cntl, adc, ax, ay, az.
  ///
  /// Flags are encoded as `0` for OK and `-1` for NG.
  pub fn codes(&self) -> [i32; 10] {
    let flag = |ok: bool| if ok { 0 } else { -1 };
    [
      flag(self.calibration_ok),
      flag(self.passed),
      self.response.x as i32,
      self.response.y as i32,
      self.response.z as i32,
      flag(self.cntl_ok),
      flag(self.adc_ok),
      self.adc.x as i32,
      self.adc.y as i32,
      self.adc.z as i32,
    ]
  }
}

/// Check a self-test response against the per-axis windows, logging each verdict.
pub fn judge(s: Sample) -> bool {
  let x = SELF_TEST_X.contains(&s.x);
  let y = SELF_TEST_Y.contains(&s.y);
  let z = SELF_TEST_Z.contains(&s.z);
  debug!("self test x {} (-200..=200), y {} (-200..=200), z {} (-1000..=-200)", x, y, z);
  x && y && z
}

fn within_adc_range(s: Sample) -> bool {
  let ok = |v: i16| v > -ADC_LIMIT && v < ADC_LIMIT;
  ok(s.x) && ok(s.y) && ok(s.z)
}

struct Attempt {
  cntl_ok: bool,
  response: Sample,
}

impl<M, I, D, E> Port<'_, M, I, D>
where
  M: RawMutex,
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  /// One pass of the self-test sequence.
  ///
  /// The CNTL2 readback and the identity read are diagnostics only. The data
  /// registers are read even if ready was never observed.
  async fn self_test_attempt(&mut self) -> Result<Attempt, Error<E>> {
    let written = self.power_down().await;
    let readback = self.read_u8(Reg::Cntl2).await;
    let cntl_ok = written.is_ok() && readback.is_ok();

    let mut id = [0u8; 2];
    match self.read_bytes(Reg::Wia1, &mut id).await {
      Ok(()) => info!("device id = {}, info = {}", id[0], id[1]),
      Err(_) => warn!("device id read failed"),
    }

    self.set_mode(Mode::SelfTest).await?;

    let mut ready = false;
    for _ in 0..SELF_TEST_READY_POLLS {
      self.sleep_ms(SELF_TEST_POLL_MS).await;
      if let Ok(raw) = self.read_u8(Reg::St1).await {
        if St1::try_from([raw]).map(|st1| st1.drdy).unwrap_or(false) {
          ready = true;
          break;
        }
      }
    }
    if !ready {
      warn!("self test data ready not observed, reading anyway");
    }

    let response = self.read_axes().await?;
    Ok(Attempt { cntl_ok, response })
  }

  /// Take a normal conversion after the test and range-check it.
  async fn adc_check(&mut self) -> (bool, Sample) {
    for attempt in 0..ADC_CHECK_ATTEMPTS {
      if let Ok(s) = self.acquire().await {
        self.state.set_last(s);
        let ok = within_adc_range(s);
        if !ok {
          error!("adc out of range {}, {}, {}", s.x, s.y, s.z);
        }
        return (ok, s);
      }
      self.sleep_ms(ADC_CHECK_RETRY_MS).await;
      error!("adc retries {}", attempt);
    }
    (false, Sample::default())
  }
}

impl<I, D, C, M, E> Ak09916<I, D, C, M>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
  C: Clock,
  M: RawMutex,
{
  /// Run the factory self-test.
  ///
  /// A running stream is stopped (and the sensor powered down) for the
  /// duration and re-armed afterwards. A failing part is reported through
  /// [`SelfTestReport::passed`]; `Err` means the bus itself failed.
  pub async fn run_self_test(&self) -> Result<SelfTestReport, Error<E>> {
    let _control = self.control.lock().await;
    let resume = self.state.is_enabled() && self.scheduler.is_armed();

    if resume {
      self.scheduler.disarm().await;
    }

    let outcome = self.self_test_sequence(resume).await;

    if resume {
      let programmed = self.port().await.set_mode(Mode::Single).await;
      self.scheduler.arm();
      if outcome.is_ok() {
        programmed?;
      }
    }
    outcome
  }

  async fn self_test_sequence(&self, was_streaming: bool) -> Result<SelfTestReport, Error<E>> {
    // One transport lock for the whole run, ADC check included.
    let mut port = self.port().await;
    if was_streaming {
      port.power_down().await?;
    }

    let mut retries = 0;
    let (passed, attempt) = loop {
      let attempt = port.self_test_attempt().await?;
      let r = attempt.response;
      info!("self test x = {}, y = {}, z = {}", r.x, r.y, r.z);

      if judge(r) {
        info!("self test successful");
        break (true, attempt);
      }
      if retries >= SELF_TEST_RETRIES {
        error!("self test failed");
        break (false, attempt);
      }
      retries += 1;
      warn!("self test retry {}", retries);
    };

    let (adc_ok, adc) = port.adc_check().await;

    Ok(SelfTestReport {
      calibration_ok: self.asa.is_valid(),
      passed,
      response: attempt.response,
      cntl_ok: attempt.cntl_ok,
      adc_ok,
      adc,
    })
  }
}
