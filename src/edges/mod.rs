//! Edge utilities: image gradients feeding the circle accumulator.
//!
//! Borders are handled by clamping indices (replicate).

pub mod grad;

pub use grad::{sobel_gradients, Grad};
