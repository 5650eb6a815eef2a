//! Status LED task

use defmt::*;
use embassy_time::{Duration, Ticker};

use synchron_core::status::GeneratorStatus;
use synchron_core::traits::StatusIndicator;
use synchron_drivers::status_led::StatusLed;
use synchron_hal_rp2040::RpOutput;

use crate::channels::{STATUS, TELEGRAM_SENT};

/// LED update interval in milliseconds
const STATUS_TICK_MS: u32 = 20;

/// Status LED task
///
/// Shows the latest status and restarts the running flash on every
/// telegram so the LED blinks with the line.
#[embassy_executor::task]
pub async fn status_task(mut led: StatusLed<RpOutput<'static>>) {
    info!("Status task started");

    let mut ticker = Ticker::every(Duration::from_millis(STATUS_TICK_MS as u64));

    loop {
        if let Some(status) = STATUS.try_take() {
            debug!("Status: {}", status);
            led.show(status);
        }
        if TELEGRAM_SENT.try_take().is_some() && led.status() == GeneratorStatus::Running {
            led.restart();
        }

        ticker.next().await;
        led.tick(STATUS_TICK_MS);
    }
}
