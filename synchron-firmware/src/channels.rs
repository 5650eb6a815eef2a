//! Inter-task communication channels
//!
//! Defines the statics shared between the pulse interrupt and the tasks.
//! Every slot is a `Signal`: last write wins, nothing queues.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use portable_atomic::AtomicU32;

use synchron_core::status::GeneratorStatus;
use synchron_core::Ticks;

/// Tick captured at the latest pulse edge (consumed by the generator)
pub static PULSE: Signal<CriticalSectionRawMutex, Ticks> = Signal::new();

/// Tick captured at the latest pulse edge (consumed by the clock sync)
pub static SECOND_EDGE: Signal<CriticalSectionRawMutex, Ticks> = Signal::new();

/// The clock sync task finished its first RTC read
pub static CLOCK_READY: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Pulse edges seen since boot
pub static PULSE_COUNT: AtomicU32 = AtomicU32::new(0);

/// Generator status for the indicator
pub static STATUS: Signal<CriticalSectionRawMutex, GeneratorStatus> = Signal::new();

/// A telegram left the line
pub static TELEGRAM_SENT: Signal<CriticalSectionRawMutex, ()> = Signal::new();
