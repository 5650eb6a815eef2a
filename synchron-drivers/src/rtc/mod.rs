//! Real-time clock drivers

pub mod ds3231;

pub use ds3231::{Ds3231, Ds3231Error, SquareWaveRate};
