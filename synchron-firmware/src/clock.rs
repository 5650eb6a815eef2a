//! Shared software clock
//!
//! Written by the clock sync task, read by the generator when composing a
//! telegram. The clock is `Copy`, so readers take a snapshot under the lock
//! and work on it without holding anything.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Instant, TICK_HZ};

use synchron_core::clock::SyncedClock;
use synchron_core::time::{TimeSample, TimeValidity};
use synchron_core::traits::TimeSource;

static CLOCK: Mutex<CriticalSectionRawMutex, Cell<SyncedClock>> =
    Mutex::new(Cell::new(SyncedClock::new(0, TICK_HZ)));

/// Copy of the clock as it is now
pub fn snapshot() -> SyncedClock {
    CLOCK.lock(|clock| clock.get())
}

/// Modify the clock under the lock
pub fn update(f: impl FnOnce(&mut SyncedClock)) {
    CLOCK.lock(|clock| {
        let mut value = clock.get();
        f(&mut value);
        clock.set(value);
    });
}

/// The shared clock read at the current instant
pub struct SharedClock;

impl TimeSource for SharedClock {
    fn current_local_time(&self) -> (TimeSample, TimeValidity) {
        snapshot().now_at(Instant::now().as_ticks())
    }
}
