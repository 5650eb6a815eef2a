//! Calendar time as consumed by the telegram encoder
//!
//! The time subsystem hands out [`TimeSample`] snapshots tagged with a
//! [`TimeValidity`]. Samples are already in local time; no time-zone
//! conversion happens here.

pub mod sample;
pub mod validity;

pub use sample::{TimeError, TimeSample, EPOCH, MAX_YEAR, MIN_YEAR};
pub use validity::TimeValidity;
