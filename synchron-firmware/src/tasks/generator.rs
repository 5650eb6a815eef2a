//! Telegram generator task
//!
//! Runs the scheduler against the real clock: bootstraps on the first
//! second boundary, then for every pulse sleeps until one telegram length
//! before the next boundary and sends the telegram for that second.
//!
//! Runs on its own interrupt executor, below the pulse capture and above
//! everything in thread mode.

use defmt::*;
use embassy_futures::yield_now;
use embassy_time::{with_timeout, Duration, Instant, Timer};

use synchron_core::scheduler::{
    PulseAction, PulseVerdict, SchedulerTiming, TelegramScheduler, WakeVerdict,
};
use synchron_core::status::GeneratorStatus;
use synchron_core::traits::TimeSource;
use synchron_hal::UartTx;
use synchron_hal_rp2040::RpUartTx;

use crate::channels::{CLOCK_READY, PULSE, STATUS, TELEGRAM_SENT};
use crate::clock::{self, SharedClock};

/// Telegrams between jitter reports
const JITTER_REPORT_INTERVAL: u32 = 600;

/// Generator task
#[embassy_executor::task]
pub async fn generator_task(mut tx: RpUartTx<'static>, timing: SchedulerTiming) {
    info!(
        "Generator task started (lead {} ticks, watchdog {} ticks)",
        timing.lead, timing.watchdog
    );

    STATUS.signal(GeneratorStatus::Starting);

    // Until the first RTC read the clock counts from boot
    let ready = with_timeout(Duration::from_ticks(timing.bootstrap_timeout), CLOCK_READY.wait());
    if ready.await.is_err() {
        warn!("No RTC reading yet, bootstrapping on the free-running clock");
    }
    let anchored = clock::snapshot().last_sync().is_some();

    let mut scheduler = TelegramScheduler::new(timing, Instant::now().as_ticks());

    // Poll until the clock's second changes
    loop {
        let (now, _) = SharedClock.current_local_time();
        match scheduler.poll_boundary(now.second(), Instant::now().as_ticks()) {
            Ok(Some(baseline)) => {
                info!("Second boundary found at tick {}", baseline);
                break;
            }
            Ok(None) => yield_now().await,
            Err(fault) => {
                error!("Bootstrap failed: {}", fault);
                STATUS.signal(GeneratorStatus::Fault);
                return;
            }
        }
    }

    // Edges seen while bootstrapping are stale
    PULSE.reset();
    STATUS.signal(GeneratorStatus::Running);

    let watchdog = Duration::from_ticks(timing.watchdog);

    loop {
        let pulse = match with_timeout(watchdog, PULSE.wait()).await {
            Ok(tick) => tick,
            Err(_) => {
                if let Some(fault) = scheduler.on_timeout() {
                    warn!("No pulse within {} ticks: {}", timing.watchdog, fault);
                    STATUS.signal(GeneratorStatus::PulseLost);
                }
                continue;
            }
        };

        let wake = match scheduler.on_pulse(pulse) {
            PulseAction::Transmit {
                wake,
                verdict,
                recovered,
            } => {
                if recovered {
                    info!("Pulse recovered");
                    STATUS.signal(GeneratorStatus::Running);
                }
                match verdict {
                    PulseVerdict::First if anchored => {
                        if let Some(phase) = scheduler.phase() {
                            info!(
                                "First pulse {} ticks after the clock boundary",
                                phase.boundary_offset(pulse)
                            );
                        }
                    }
                    PulseVerdict::Missed(n) => warn!("{} pulse(s) missed", n),
                    PulseVerdict::First | PulseVerdict::OnTime | PulseVerdict::Spurious => {}
                }
                wake
            }
            PulseAction::Ignore => {
                debug!("Spurious pulse at tick {}", pulse);
                continue;
            }
        };

        Timer::at(Instant::from_ticks(wake)).await;

        if let WakeVerdict::Late(late) = scheduler.check_wake(wake, Instant::now().as_ticks()) {
            warn!("Woke {} ticks late, telegram skipped", late);
            continue;
        }

        let telegram = scheduler.compose(&clock::snapshot().at(scheduler.reading_tick(pulse)));
        match tx.write_blocking(&telegram).and_then(|_| tx.flush()) {
            Ok(()) => {
                scheduler.record_sent();
                TELEGRAM_SENT.signal(());
                debug!("Sent {}", telegram);
            }
            Err(e) => warn!("Telegram write failed: {}", e),
        }

        let stats = scheduler.stats();
        if stats.telegrams > 0 && stats.telegrams % JITTER_REPORT_INTERVAL == 0 {
            let jitter = scheduler.jitter();
            info!(
                "{} telegrams, wake lateness over last {}: max {} latest {} ticks, {} missed, {} late",
                stats.telegrams,
                jitter.len(),
                jitter.max(),
                jitter.latest(),
                stats.missed_pulses,
                stats.late_wakes
            );
        }
    }
}
