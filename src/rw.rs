use core::sync::atomic::{AtomicU8, Ordering};

use embassy_sync::{blocking_mutex::raw::RawMutex, mutex::MutexGuard};
use embedded_hal_async::{delay::DelayNs, i2c::*};

use crate::{defs::Reg, state::State, Error, Orientation};

/// Whether the bus may be used. `Locked` while the sensor is held in an external reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
  Normal = 0,
  Locked = 1,
}

pub(crate) struct Link(AtomicU8);

impl Link {
  pub(crate) const fn new() -> Self {
    Self(AtomicU8::new(LinkState::Normal as u8))
  }

  pub(crate) fn state(&self) -> LinkState {
    match self.0.load(Ordering::Acquire) {
      0 => LinkState::Normal,
      _ => LinkState::Locked,
    }
  }

  pub(crate) fn set(&self, s: LinkState) {
    self.0.store(s as u8, Ordering::Release);
  }
}

/// Everything behind the transport lock.
pub(crate) struct Bus<I, D> {
  pub(crate) i2c: I,
  pub(crate) delay: D,
  pub(crate) address: u8,
}

/// Exclusive access to the bus for one multi-step transaction.
///
/// Holding a `Port` is holding the transport lock; mode writes, status polls and
/// data reads issued through one `Port` cannot interleave with another caller's.
pub(crate) struct Port<'a, M: RawMutex, I, D> {
  pub(crate) bus: MutexGuard<'a, M, Bus<I, D>>,
  pub(crate) state: &'a State<M>,
  pub(crate) orientation: Orientation,
}

impl<M, I, D, E> Port<'_, M, I, D>
where
  M: RawMutex,
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  #[inline]
  fn gate(&self) -> Result<(), Error<E>> {
    match self.state.link.state() {
      LinkState::Normal => Ok(()),
      LinkState::Locked => Err(Error::LockedOut),
    }
  }

  pub(crate) async fn read<const N: usize, T: TryFrom<[u8; N]>>(&mut self, reg: Reg) -> Result<T, Error<E>> {
    let mut b = [0u8; N];
    self.read_bytes(reg, &mut b).await?;
    TryFrom::try_from(b).map_err(|_| Error::Data)
  }

  pub(crate) async fn read_u8(&mut self, reg: Reg) -> Result<u8, Error<E>> {
    self.gate()?;
    let bus = &mut *self.bus;
    let mut b = [0u8; 1];
    bus.i2c.write_read(bus.address, &[reg.into()], &mut b).await.map_err(|e| {
      error!("i2c read of reg {} failed", u8::from(reg));
      Error::I2c(e)
    })?;
    Ok(b[0])
  }

  pub(crate) async fn read_bytes(&mut self, reg: Reg, buf: &mut [u8]) -> Result<(), Error<E>> {
    self.gate()?;
    let len = buf.len();
    let bus = &mut *self.bus;
    bus.i2c.write_read(bus.address, &[reg.into()], buf).await.map_err(|e| {
      error!("i2c block read of {} bytes at reg {} failed", len, u8::from(reg));
      Error::I2c(e)
    })
  }

  pub(crate) async fn write_u8(&mut self, reg: Reg, value: u8) -> Result<(), Error<E>> {
    self.gate()?;
    let bus = &mut *self.bus;
    bus.i2c.write(bus.address, &[reg.into(), value]).await.map_err(|e| {
      error!("i2c write of reg {} failed", u8::from(reg));
      Error::I2c(e)
    })
  }

  pub(crate) async fn sleep_us(&mut self, us: u32) {
    self.bus.delay.delay_us(us).await;
  }

  pub(crate) async fn sleep_ms(&mut self, ms: u32) {
    self.bus.delay.delay_ms(ms).await;
  }
}
