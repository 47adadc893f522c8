//! Sensitivity adjustment (ASA) bytes.
//!
//! The AK09916 has no fuse ROM to read them from, so the values come from
//! [`Config`](crate::Config) and default to the neutral midpoint. They are
//! reported for factory tooling and never applied to samples.

/// Per-axis sensitivity adjustment bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Asa(pub [u8; 3]);

impl Default for Asa {
  fn default() -> Self {
    Asa([128; 3])
  }
}

impl Asa {
  /// `0x00` and `0xFF` mean the trim was never programmed.
  pub fn is_valid(&self) -> bool {
    self.0.iter().all(|&b| b != 0x00 && b != 0xFF)
  }
}
