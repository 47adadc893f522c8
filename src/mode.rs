//! Operating modes and the CNTL2 write/settle sequence.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::{delay::DelayNs, i2c::*};

use crate::{clock::Clock, defs::*, rw::Port, Ak09916, Error};

/// CNTL2 operating modes.
///
/// The continuous modes exist on the chip but this driver paces measurements
/// itself with single shots, so [`set_mode`](crate::Ak09916::set_mode) rejects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
  PowerDown = 0x00,
  Single = 0x01,
  Continuous10Hz = 0x02,
  Continuous20Hz = 0x04,
  Continuous50Hz = 0x06,
  Continuous100Hz = 0x08,
  SelfTest = 0x10,
}

impl Mode {
  /// Modes the driver is willing to program.
  pub const fn is_supported(self) -> bool {
    matches!(self, Mode::PowerDown | Mode::Single | Mode::SelfTest)
  }
}

impl From<Mode> for u8 {
  fn from(m: Mode) -> Self {
    m as u8
  }
}

impl TryFrom<u8> for Mode {
  type Error = ();

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    // Only MODE[4:0] is defined; upper bits read back as zero.
    match value & 0x1F {
      0x00 => Ok(Mode::PowerDown),
      0x01 => Ok(Mode::Single),
      0x02 => Ok(Mode::Continuous10Hz),
      0x04 => Ok(Mode::Continuous20Hz),
      0x06 => Ok(Mode::Continuous50Hz),
      0x08 => Ok(Mode::Continuous100Hz),
      0x10 => Ok(Mode::SelfTest),
      _ => Err(()),
    }
  }
}

impl<M, I, D, E> Port<'_, M, I, D>
where
  M: RawMutex,
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  /// Program CNTL2 and wait out the settling time.
  ///
  /// Entering power-down also drops the interpolation baseline.
  pub(crate) async fn set_mode(&mut self, mode: Mode) -> Result<(), Error<E>> {
    if !mode.is_supported() {
      error!("refusing mode {}", u8::from(mode));
      return Err(Error::InvalidMode(mode.into()));
    }
    if mode == Mode::PowerDown {
      self.state.reset_baseline();
    }
    self.write_u8(Reg::Cntl2, mode.into()).await?;
    trace!("mode -> {}", u8::from(mode));
    self.sleep_us(MODE_SETTLE_US).await;
    Ok(())
  }

  pub(crate) async fn power_down(&mut self) -> Result<(), Error<E>> {
    self.set_mode(Mode::PowerDown).await
  }

  /// Read CNTL2 back.
  pub(crate) async fn get_mode(&mut self) -> Result<Mode, Error<E>> {
    let raw = self.read_u8(Reg::Cntl2).await?;
    Mode::try_from(raw).map_err(|_| Error::Data)
  }
}

impl<I, D, C, M, E> Ak09916<I, D, C, M>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
  C: Clock,
  M: RawMutex,
{
  /// Program an operating mode directly.
  ///
  /// Only [`Mode::PowerDown`], [`Mode::Single`] and [`Mode::SelfTest`] are
  /// accepted. Meant for bring-up; the stream programs modes on its own.
  pub async fn set_mode(&self, mode: Mode) -> Result<(), Error<E>> {
    self.port().await.set_mode(mode).await
  }

  pub async fn power_down(&self) -> Result<(), Error<E>> {
    self.port().await.power_down().await
  }

  /// Write power-down and read CNTL2 back; `true` if both transfers worked
  /// and the mode stuck.
  pub async fn check_cntl(&self) -> bool {
    let mut port = self.port().await;
    let written = port.power_down().await;
    let mode = port.get_mode().await;
    matches!((written, mode), (Ok(()), Ok(Mode::PowerDown)))
  }
}
