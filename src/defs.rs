#![allow(dead_code)]

#[derive(Clone, Copy)]
#[repr(u8)]
pub(crate) enum Reg {
  Wia1 = 0x00,
  Wia2 = 0x01,
  St1 = 0x10,
  Hxl = 0x11,
  Hxh = 0x12,
  Hyl = 0x13,
  Hyh = 0x14,
  Hzl = 0x15,
  Hzh = 0x16,
  Tmps = 0x17,
  St2 = 0x18,
  Cntl2 = 0x31,
  Cntl3 = 0x32,
}

impl From<Reg> for u8 {
  #[inline]
  fn from(r: Reg) -> Self {
    r as u8
  }
}

// Identity
pub(crate) const AK09916_WIA1: u8 = 0x48;
pub(crate) const AK09916_WIA2: u8 = 0x09;

/// Default 7-bit I2C address.
pub const ADDR_I2C: u8 = 0x0C;

pub const VENDOR: &str = "AKM";
pub const MODEL: &str = "AK09916C";

// Timing. Datasheet asks for a wait after every CNTL2 write before ST1 is valid.
pub(crate) const MODE_SETTLE_US: u32 = 100;
pub(crate) const DRDY_RETRIES: u8 = 5;
pub(crate) const DRDY_RETRY_US: u32 = 2_000;

/// Shortest accepted sampling interval (10 ms).
pub const MIN_DELAY_NS: u64 = 10_000_000;
/// Longest accepted sampling interval (200 ms).
pub const MAX_DELAY_NS: u64 = 200_000_000;
/// Interval used until the host picks one.
pub const DEFAULT_DELAY_NS: u64 = 200_000_000;

// Self-test
pub(crate) const SELF_TEST_RETRIES: u8 = 5;
pub(crate) const SELF_TEST_READY_POLLS: u8 = 10;
pub(crate) const SELF_TEST_POLL_MS: u32 = 20;
pub(crate) const ADC_CHECK_ATTEMPTS: u8 = 5;
pub(crate) const ADC_CHECK_RETRY_MS: u32 = 20;
pub(crate) const ADC_LIMIT: i16 = 6500;

// Block sizes
pub(crate) const MEASUREMENT_LEN: usize = 8;
pub(crate) const REGISTER_DUMP_LEN: usize = 13;

/// Output resolution, µT per LSB.
pub(crate) const MICRO_TESLA_PER_LSB: f32 = 0.15;
