//! Crate-internal logging macros.
//!
//! Messages go to `defmt` and/or `log` depending on the enabled features and
//! compile to nothing when neither is enabled. Format strings must stay within
//! the subset both backends understand (plain `{}` on integers and bools).
#![allow(unused_macros)]

macro_rules! forward {
  ($level:ident, $s:literal $(, $x:expr)* $(,)?) => {{
    #[cfg(feature = "defmt")]
    ::defmt::$level!($s $(, $x)*);
    #[cfg(feature = "log")]
    ::log::$level!($s $(, $x)*);
    #[cfg(not(any(feature = "defmt", feature = "log")))]
    {
      let _ = ($(&$x),*);
    }
  }};
}

macro_rules! trace {
  ($($t:tt)*) => { forward!(trace, $($t)*) };
}

macro_rules! debug {
  ($($t:tt)*) => { forward!(debug, $($t)*) };
}

macro_rules! info {
  ($($t:tt)*) => { forward!(info, $($t)*) };
}

macro_rules! warn {
  ($($t:tt)*) => { forward!(warn, $($t)*) };
}

macro_rules! error {
  ($($t:tt)*) => { forward!(error, $($t)*) };
}
