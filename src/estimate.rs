//! Heuristics behind the displayed pseudo-progress.
//!
//! The video service reports a coarse status and rarely a usable percentage,
//! so progress is interpolated against an expected duration derived from the
//! narration script. The result is an approximation, not a measurement.

pub mod duration;
pub mod progress;

pub use duration::{expected_duration, expected_duration_secs, word_count};
pub use progress::estimate;
