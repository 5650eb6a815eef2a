//! Pulse capture
//!
//! These tasks run on the interrupt-priority executor and preempt
//! everything in thread mode. Their only job is to timestamp the edge and
//! hand the tick over.

use embassy_rp::gpio::Input;
use embassy_time::{Duration, Instant, Ticker};
use portable_atomic::Ordering;

use crate::channels::{PULSE, PULSE_COUNT, SECOND_EDGE};

/// Pulse handler
///
/// Timestamps the edge and wakes the consumers. Does nothing else: no
/// logging, no encoding, no transport.
#[inline]
pub fn on_pulse() {
    let tick = Instant::now().as_ticks();
    PULSE_COUNT.fetch_add(1, Ordering::Relaxed);
    PULSE.signal(tick);
    SECOND_EDGE.signal(tick);
}

/// Pulse from the RTC square wave output
///
/// SQW is open drain and falls when the seconds register advances.
#[embassy_executor::task]
pub async fn rtc_pulse_task(mut sqw: Input<'static>) {
    loop {
        sqw.wait_for_falling_edge().await;
        on_pulse();
    }
}

/// Pulse from the on-chip timer, for boards without an RTC
#[embassy_executor::task]
pub async fn timer_pulse_task(period: Duration) {
    let mut ticker = Ticker::every(period);
    loop {
        ticker.next().await;
        on_pulse();
    }
}
