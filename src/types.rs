use micromath::vector::Vector3d;

use crate::defs::MICRO_TESLA_PER_LSB;

/// One 3-axis reading in raw LSB, little-endian on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 6)]
pub struct Sample {
  #[bits(16)]
  pub x: i16,
  #[bits(16)]
  pub y: i16,
  #[bits(16)]
  pub z: i16,
}

impl Default for Sample {
  fn default() -> Self {
    Sample { x: 0, y: 0, z: 0 }
  }
}

impl Sample {
  pub const fn new(x: i16, y: i16, z: i16) -> Self {
    Self { x, y, z }
  }

  /// Flux density in µT using the fixed 0.15 µT/LSB output resolution.
  pub fn micro_tesla(self) -> Vector3d<f32> {
    Vector3d {
      x: self.x as f32 * MICRO_TESLA_PER_LSB,
      y: self.y as f32 * MICRO_TESLA_PER_LSB,
      z: self.z as f32 * MICRO_TESLA_PER_LSB,
    }
  }
}

impl From<Sample> for Vector3d<i16> {
  fn from(s: Sample) -> Self {
    Vector3d { x: s.x, y: s.y, z: s.z }
  }
}

impl From<Vector3d<i16>> for Sample {
  fn from(v: Vector3d<i16>) -> Self {
    Sample { x: v.x, y: v.y, z: v.z }
  }
}

/// A streamed reading.
///
/// `synthetic` marks frames backfilled by the jitter compensation: they repeat
/// the axis values of the real reading that follows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MagEvent {
  pub sample: Sample,
  pub timestamp_ns: u64,
  pub synthetic: bool,
}
