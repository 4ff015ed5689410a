//! Multiple testing correction.

pub mod bh;

pub use bh::{benjamini_hochberg, correct_bh, BhCorrected};
