#![no_std]
#![doc = include_str!("../README.md")]
//!
//! ## Design Principles
//!
//! - **One owned context**: every operation goes through an [`Ak09916`]
//!   borrowed as `&self`; no global state
//! - **Two lock domains**: a control lock serializes enable/interval/self-test
//!   transitions, a transport lock keeps multi-register transactions whole
//! - **Async-first**: built on `embedded-hal-async` I2C and delay traits
//! - **Explicit periodic task**: [`Ak09916::run`] is a cancellable loop, not a
//!   self-rescheduling callback
//!
//! ## Module Organization
//!
//! - [`mode`]: operating modes and the settle-after-write rule
//! - [`orientation`]: mounting codes and axis remap tables
//! - [`interpolate`]: jitter compensation for the sample stream
//! - [`selftest`]: factory self-test
//! - [`calib`]: sensitivity adjustment bytes

use embassy_sync::{
  blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex},
  mutex::Mutex,
};
use embedded_hal_async::{delay::DelayNs, i2c::*};

#[macro_use]
mod fmt;

pub mod calib;
mod clock;
mod control;
mod defs;
pub mod interpolate;
mod measure;
pub mod mode;
pub mod orientation;
pub(crate) mod rw;
mod scheduler;
pub mod selftest;
mod state;
mod types;

pub use calib::Asa;
pub use clock::*;
pub use defs::{ADDR_I2C, DEFAULT_DELAY_NS, MAX_DELAY_NS, MIN_DELAY_NS, MODEL, VENDOR};
use defs::*;
pub use mode::Mode;
pub use orientation::Orientation;
pub use rw::LinkState;
pub use scheduler::EventSink;
pub use selftest::SelfTestReport;
pub use types::*;

use rw::{Bus, Port};
use scheduler::Scheduler;
use state::State;

/// Driver error type.
///
/// Wraps the underlying I2C error and adds AK09916-specific conditions.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
  /// I2C communication error
  I2c(E),
  /// Transport refused: the sensor is held in an external reset
  LockedOut,
  /// WIA1/WIA2 did not read 0x48/0x09
  InvalidDeviceId { company: u8, device: u8 },
  /// Mode this driver does not program
  InvalidMode(u8),
  /// ST1 never reported data ready within the retry budget
  DataNotReady { st1: u8 },
  /// Register contents could not be decoded
  Data,
}

/// Static configuration, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
  /// 7-bit I2C address
  pub address: u8,
  /// Mounting of the package on the board
  pub orientation: Orientation,
  /// Initial sampling interval in ns, clamped to the accepted range
  pub delay_ns: u64,
  /// Sensitivity adjustment bytes reported to factory tooling
  pub asa: Asa,
}

impl Default for Config {
  fn default() -> Self {
    Config { address: ADDR_I2C, orientation: Orientation::default(), delay_ns: DEFAULT_DELAY_NS, asa: Asa::default() }
  }
}

/// AK09916 device driver instance.
///
/// # Type Parameters
///
/// - `I`: I2C implementation (must implement `embedded_hal_async::i2c::I2c`)
/// - `D`: Delay provider for settle and poll waits, used under the transport lock
/// - `C`: Monotonic [`Clock`] for sample timestamps
/// - `M`: Raw mutex flavour guarding both lock domains
///
/// # Examples
///
/// ```no_run
/// # async fn example<I, D, C, M>(i2c: I, delay: D, clock: C) -> Result<(), ak09916::Error<I::Error>>
/// # where I: embedded_hal_async::i2c::I2c, D: embedded_hal_async::delay::DelayNs, C: ak09916::Clock,
/// #   M: embassy_sync::blocking_mutex::raw::RawMutex {
/// use ak09916::{Ak09916, Config};
///
/// let mag: Ak09916<_, _, _, M> = Ak09916::new(i2c, delay, clock, Config::default());
/// mag.init().await?;
///
/// let sample = mag.read_raw().await?;
/// mag.set_delay_ns(20_000_000).await;
/// mag.set_enabled(true).await?;
/// # Ok(())
/// # }
/// ```
pub struct Ak09916<I, D, C, M: RawMutex = CriticalSectionRawMutex> {
  bus: Mutex<M, Bus<I, D>>,
  control: Mutex<M, ()>,
  state: State<M>,
  scheduler: Scheduler<M>,
  clock: C,
  orientation: Orientation,
  asa: Asa,
}

impl<I, D, C, M, E> Ak09916<I, D, C, M>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
  C: Clock,
  M: RawMutex,
{
  /// Create a driver instance. No bus traffic until [`init`](Self::init).
  pub fn new(i2c: I, delay: D, clock: C, config: Config) -> Self {
    Self {
      bus: Mutex::new(Bus { i2c, delay, address: config.address }),
      control: Mutex::new(()),
      state: State::new(config.delay_ns),
      scheduler: Scheduler::new(),
      clock,
      orientation: config.orientation,
      asa: config.asa,
    }
  }

  /// Verify the part and leave it powered down.
  ///
  /// On error the instance should be dropped or [`release`](Self::release)d.
  pub async fn init(&self) -> Result<(), Error<E>> {
    let mut port = self.port().await;
    let id: DeviceId = port.read(Reg::Wia1).await.map_err(|e| {
      error!("unable to read WIA1");
      e
    })?;
    port.power_down().await?;

    if id.company != AK09916_WIA1 || id.device != AK09916_WIA2 {
      error!("wrong device, id = {}, {}", id.company, id.device);
      return Err(Error::InvalidDeviceId { company: id.company, device: id.device });
    }
    info!("{} {} ready (chip pos: {})", VENDOR, MODEL, u8::from(self.orientation));
    Ok(())
  }

  /// Give the bus and delay back.
  pub fn release(self) -> (I, D) {
    let bus = self.bus.into_inner();
    (bus.i2c, bus.delay)
  }

  /// Power down, then read the 13 registers from WIA1 upwards.
  pub async fn dump_registers(&self) -> Result<[u8; REGISTER_DUMP_LEN], Error<E>> {
    let mut port = self.port().await;
    port.power_down().await?;
    let mut b = [0u8; REGISTER_DUMP_LEN];
    port.read_bytes(Reg::Wia1, &mut b).await?;
    Ok(b)
  }

  pub fn orientation(&self) -> Orientation {
    self.orientation
  }

  /// Sensitivity adjustment bytes.
  pub fn calibration(&self) -> [u8; 3] {
    self.asa.0
  }

  /// Whether the sensitivity adjustment bytes look programmed.
  pub fn calibration_ok(&self) -> bool {
    self.asa.is_valid()
  }

  pub(crate) async fn port(&self) -> Port<'_, M, I, D> {
    Port { bus: self.bus.lock().await, state: &self.state, orientation: self.orientation }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 2)]
struct DeviceId {
  pub company: u8,
  pub device: u8,
}
