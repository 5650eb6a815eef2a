//! Embassy async tasks
//!
//! The pulse tasks run on the highest interrupt executor and the generator
//! on a second one below it; clock sync and status run in thread mode. Tasks communicate through the signals in
//! `channels`.

pub mod clock_sync;
pub mod generator;
pub mod pulse;
pub mod status;

pub use clock_sync::{clock_sync_task, RtcBus};
pub use generator::generator_task;
pub use pulse::{rtc_pulse_task, timer_pulse_task};
pub use status::status_task;
