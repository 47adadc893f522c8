//! Single-shot measurement: trigger, wait for data ready, read and remap.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::{delay::DelayNs, i2c::*};
use micromath::vector::Vector3d;

use crate::{clock::Clock, defs::*, mode::Mode, rw::Port, Ak09916, Error, Sample};

impl<I, D, C, M, E> Ak09916<I, D, C, M>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
  C: Clock,
  M: RawMutex,
{
  /// Read one sample in raw LSB, device frame.
  ///
  /// While the stream is enabled this returns the last streamed sample
  /// without touching the bus. Otherwise a single-shot measurement is taken
  /// and remembered as the last sample.
  pub async fn read_raw(&self) -> Result<Sample, Error<E>> {
    if self.state.is_enabled() {
      return Ok(self.state.last());
    }
    let sample = self.port().await.acquire().await?;
    self.state.set_last(sample);
    Ok(sample)
  }

  /// Like [`read_raw`](Self::read_raw), scaled to µT.
  pub async fn read_micro_tesla(&self) -> Result<Vector3d<f32>, Error<E>> {
    Ok(self.read_raw().await?.micro_tesla())
  }
}

impl<M, I, D, E> Port<'_, M, I, D>
where
  M: RawMutex,
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  /// Take one measurement and return it in the device frame.
  ///
  /// Sequence:
  /// - Program single-measurement mode.
  /// - Poll `ST1.DRDY`. While ST1 reads as all zeros the conversion is still
  ///   running, so retry up to `DRDY_RETRIES` times 2 ms apart. Any other
  ///   not-ready value fails at once.
  /// - Read HXL..ST2 in one burst; reading ST2 releases the data registers.
  pub(crate) async fn acquire(&mut self) -> Result<Sample, Error<E>> {
    let mut seen = (0u8, 0u8);
    let result = self.measure(&mut seen).await;
    if result.is_err() {
      error!("measurement failed, ST1 = {}, ST2 = {}", seen.0, seen.1);
    }
    result
  }

  async fn measure(&mut self, seen: &mut (u8, u8)) -> Result<Sample, Error<E>> {
    self.set_mode(Mode::Single).await?;

    let mut retries = 0;
    loop {
      let raw = self.read_u8(Reg::St1).await?;
      seen.0 = raw;
      let st1 = St1::try_from([raw]).map_err(|_| Error::Data)?;
      if st1.drdy {
        if st1.dor {
          debug!("data overrun, a conversion was skipped");
        }
        break;
      }
      if raw == 0 && retries < DRDY_RETRIES {
        retries += 1;
        self.sleep_us(DRDY_RETRY_US).await;
        continue;
      }
      return Err(Error::DataNotReady { st1: raw });
    }

    let mut b = [0u8; MEASUREMENT_LEN];
    self.read_bytes(Reg::Hxl, &mut b).await?;
    seen.1 = b[MEASUREMENT_LEN - 1];
    let m = Measurement::try_from(b).map_err(|_| Error::Data)?;
    if m.hofl {
      warn!("magnetic sensor overflow, ST2 = {}", seen.1);
    }

    Ok(self.orientation.remap(Sample { x: m.x, y: m.y, z: m.z }))
  }

  /// Read the bare axis registers, without triggering or remapping.
  pub(crate) async fn read_axes(&mut self) -> Result<Sample, Error<E>> {
    self.read(Reg::Hxl).await
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
pub(crate) struct St1 {
  pub drdy: bool,
  pub dor: bool,
}

/// HXL..ST2 burst: three axes, the TMPS dummy byte, then ST2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 8)]
struct Measurement {
  #[bits(16)]
  pub x: i16,
  #[bits(16)]
  pub y: i16,
  #[bits(16)]
  pub z: i16,
  #[skip(11)]
  pub hofl: bool,
}
