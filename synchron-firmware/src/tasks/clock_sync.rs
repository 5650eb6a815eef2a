//! RTC resynchronization task
//!
//! Reads the DS3231 right after a pulse edge and anchors the reading to
//! that edge's tick. Between reads the shared clock runs on the pulse.

use defmt::*;
use embassy_rp::i2c::{Blocking, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::TICK_HZ;

use synchron_drivers::rtc::Ds3231;

use crate::channels::{CLOCK_READY, SECOND_EDGE};
use crate::clock;

/// DS3231 on the shared I2C bus
pub type RtcBus = Mutex<CriticalSectionRawMutex, Ds3231<I2c<'static, I2C0, Blocking>>>;

/// Clock sync task
///
/// Syncs on the first edge, then every `resync_interval_s` seconds.
#[embassy_executor::task]
pub async fn clock_sync_task(bus: &'static RtcBus, resync_interval_s: u32) {
    info!("Clock sync task started (every {}s)", resync_interval_s);

    let interval = resync_interval_s as u64 * TICK_HZ;
    let mut last_attempt: Option<u64> = None;

    loop {
        let edge = SECOND_EDGE.wait().await;
        if let Some(last) = last_attempt {
            if edge.wrapping_sub(last) < interval {
                continue;
            }
        }
        last_attempt = Some(edge);

        let mut rtc = bus.lock().await;
        match rtc.oscillator_stopped() {
            Ok(true) => {
                warn!("RTC oscillator stopped, time not set");
                clock::update(|c| c.invalidate());
            }
            Ok(false) => match rtc.read_time() {
                Ok(sample) => {
                    clock::update(|c| c.sync(sample, edge));
                    debug!("Clock synced: {}", sample);
                }
                Err(e) => {
                    warn!("RTC read failed: {}", e);
                    clock::update(|c| c.sync_failed());
                }
            },
            Err(e) => {
                warn!("RTC status read failed: {}", e);
                clock::update(|c| c.sync_failed());
            }
        }
        drop(rtc);
        CLOCK_READY.signal(());
    }
}
