//! Mounting orientation and the fixed axis remap tables.
//!
//! The board designer picks one of eight codes describing how the package is
//! rotated relative to the device frame. Every raw reading is passed through
//! the matching signed permutation before it leaves the driver.

use crate::Sample;

/// Physical mounting of the sensor package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Orientation {
  #[default]
  TopLowerRight = 0,
  TopLowerLeft = 1,
  TopUpperLeft = 2,
  TopUpperRight = 3,
  BottomLowerRight = 4,
  BottomLowerLeft = 5,
  BottomUpperLeft = 6,
  BottomUpperRight = 7,
}

/// Row `i` gives the contribution of each raw axis to output axis `i`.
const REMAP: [[[i8; 3]; 3]; 8] = [
  [[0, 1, 0], [-1, 0, 0], [0, 0, 1]],
  [[-1, 0, 0], [0, -1, 0], [0, 0, 1]],
  [[0, -1, 0], [1, 0, 0], [0, 0, 1]],
  [[1, 0, 0], [0, 1, 0], [0, 0, 1]],
  [[0, -1, 0], [-1, 0, 0], [0, 0, -1]],
  [[1, 0, 0], [0, -1, 0], [0, 0, -1]],
  [[0, 1, 0], [1, 0, 0], [0, 0, -1]],
  [[-1, 0, 0], [0, 1, 0], [0, 0, -1]],
];

impl Orientation {
  pub const ALL: [Orientation; 8] = [
    Orientation::TopLowerRight,
    Orientation::TopLowerLeft,
    Orientation::TopUpperLeft,
    Orientation::TopUpperRight,
    Orientation::BottomLowerRight,
    Orientation::BottomLowerLeft,
    Orientation::BottomUpperLeft,
    Orientation::BottomUpperRight,
  ];

  /// Rotate a raw reading into the device frame.
  pub fn remap(self, raw: Sample) -> Sample {
    let m = &REMAP[self as usize];
    let v = [raw.x, raw.y, raw.z];
    Sample { x: apply(&m[0], &v), y: apply(&m[1], &v), z: apply(&m[2], &v) }
  }

  /// Undo [`remap`](Self::remap). The tables are orthogonal, so the inverse is the transpose.
  pub fn invert(self, mapped: Sample) -> Sample {
    let m = &REMAP[self as usize];
    let v = [mapped.x, mapped.y, mapped.z];
    let col = |j: usize| [m[0][j], m[1][j], m[2][j]];
    Sample { x: apply(&col(0), &v), y: apply(&col(1), &v), z: apply(&col(2), &v) }
  }
}

// Each row has exactly one non-zero entry, so no sum can overflow; negation
// wraps like the i16 truncation of the hardware reference.
fn apply(row: &[i8; 3], v: &[i16; 3]) -> i16 {
  let mut out = 0i16;
  for (&k, &a) in row.iter().zip(v) {
    match k {
      1 => out = a,
      -1 => out = a.wrapping_neg(),
      _ => {}
    }
  }
  out
}

impl From<Orientation> for u8 {
  fn from(o: Orientation) -> Self {
    o as u8
  }
}

impl TryFrom<u8> for Orientation {
  type Error = ();

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Orientation::ALL.get(value as usize).copied().ok_or(())
  }
}
