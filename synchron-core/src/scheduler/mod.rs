//! Phase-locked telegram scheduling
//!
//! Turns the 1 Hz reference pulse into a transmit instant one telegram
//! duration before the next second boundary, so that the last character
//! leaves the line exactly when the announced second begins.

pub mod bootstrap;
pub mod jitter;
pub mod machine;
pub mod phase;

pub use bootstrap::Bootstrap;
pub use jitter::{JitterStats, JITTER_HISTORY};
pub use machine::{
    PulseAction, SchedulerEvent, SchedulerState, SchedulerStats, SchedulerTiming,
    TelegramScheduler, WakeVerdict,
};
pub use phase::{lead_ticks, ms_to_ticks, PhaseLock, PulseVerdict};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SyncedClock;
    use crate::config::{GeneratorConfig, MAX_RESYNC_INTERVAL_S};
    use crate::telegram::encode;
    use crate::time::{TimeSample, TimeValidity};
    use crate::Ticks;

    const TICK_HZ: u64 = 1_000_000;

    /// Drive scheduler and clock through a pulse train the way the
    /// generator task does, returning the transmitted telegrams.
    fn run(start: Ticks, cycles: u64, skip: &[u64]) -> (TelegramScheduler, [u64; 2]) {
        let timing = SchedulerTiming::from_config(&GeneratorConfig::default(), TICK_HZ).unwrap();
        let period = timing.period;
        let mut scheduler = TelegramScheduler::new(timing, start);

        let first_pulse = start.wrapping_add(period / 4);
        let mut clock = SyncedClock::new(start, period);
        clock.sync(TimeSample::new(2023, 12, 31, 23, 59, 0).unwrap(), first_pulse);

        // Boundary found one period after the first pulse edge
        let mut tick = start;
        let mut second = clock.now_at(tick).0.second();
        assert_eq!(scheduler.poll_boundary(second, tick), Ok(None));
        while scheduler.state() == SchedulerState::Bootstrapping {
            tick = tick.wrapping_add(1_000);
            second = clock.now_at(tick).0.second();
            scheduler.poll_boundary(second, tick).unwrap();
        }

        let mut previous_wake: Option<Ticks> = None;
        let mut last_epoch: Option<u64> = None;
        let mut sent_and_lost = [0u64; 2];

        for n in 1..=cycles {
            let pulse = first_pulse.wrapping_add(n * period);
            if skip.contains(&n) {
                continue;
            }

            // Watchdog fires while waiting for a skipped pulse
            if n > 1 && skip.contains(&(n - 1)) && scheduler.on_timeout().is_some() {
                sent_and_lost[1] += 1;
            }

            let wake = match scheduler.on_pulse(pulse) {
                PulseAction::Transmit { wake, .. } => wake,
                PulseAction::Ignore => panic!("pulse {} ignored", n),
            };
            if let Some(prev) = previous_wake {
                assert_eq!(wake.wrapping_sub(prev) % period, 0);
            }
            previous_wake = Some(wake);

            // Wake a few hundred ticks late
            let now = wake.wrapping_add(300);
            assert!(matches!(scheduler.check_wake(wake, now), WakeVerdict::OnTime(300)));

            let telegram = scheduler.compose(&clock.at(scheduler.reading_tick(pulse)));
            assert_eq!(telegram.monitor(), b'A');

            // Announced second is the one starting at the next pulse
            let announced = clock.now_at(pulse.wrapping_add(period)).0;
            let expected = encode(Some(&announced), TimeValidity::Fresh);
            assert_eq!(telegram, expected);

            let epoch = announced.epoch_seconds();
            if let Some(last) = last_epoch {
                assert!(epoch > last);
            }
            last_epoch = Some(epoch);

            scheduler.record_sent();
            sent_and_lost[0] += 1;
        }

        (scheduler, sent_and_lost)
    }

    #[test]
    fn test_long_pulse_train() {
        let (scheduler, [sent, lost]) = run(7_000_000, 1200, &[]);
        assert_eq!(sent, 1200);
        assert_eq!(lost, 0);
        assert_eq!(scheduler.stats().telegrams, 1200);
        assert_eq!(scheduler.state(), SchedulerState::SteadyState);
    }

    #[test]
    fn test_pulse_train_across_tick_wraparound() {
        let (scheduler, [sent, _]) = run(u64::MAX - 500 * TICK_HZ, 1000, &[]);
        assert_eq!(sent, 1000);
        assert_eq!(scheduler.stats().missed_pulses, 0);
    }

    #[test]
    fn test_pulse_train_with_dropout() {
        let (scheduler, [sent, lost]) = run(0, 20, &[10]);
        assert_eq!(sent, 19);
        assert_eq!(lost, 1);
        assert_eq!(scheduler.stats().missed_pulses, 1);
        assert_eq!(scheduler.state(), SchedulerState::SteadyState);
    }

    /// Pulses from an RTC whose second is `pulse_period` local ticks long,
    /// with the clock synced once at the first pulse and never again
    fn drifting_train(pulse_period: Ticks, cycles: u64) {
        let config = GeneratorConfig {
            resync_interval_s: MAX_RESYNC_INTERVAL_S,
            ..GeneratorConfig::default()
        };
        let timing = SchedulerTiming::from_config(&config, TICK_HZ).unwrap();
        let mut scheduler = TelegramScheduler::new(timing, 0);
        assert_eq!(scheduler.poll_boundary(0, 0), Ok(None));
        assert_eq!(scheduler.poll_boundary(1, 400_000), Ok(Some(400_000)));

        let first_pulse = 1_000_000;
        let synced = TimeSample::new(2024, 1, 1, 10, 0, 0).unwrap();
        let mut clock = SyncedClock::new(0, TICK_HZ);
        clock.sync(synced, first_pulse);

        for n in 0..cycles {
            let pulse = first_pulse + n * pulse_period;
            assert!(
                matches!(scheduler.on_pulse(pulse), PulseAction::Transmit { .. }),
                "pulse {} ignored",
                n
            );

            let telegram = scheduler.compose(&clock.at(scheduler.reading_tick(pulse)));
            let announced = synced.add_seconds(n + 1).unwrap();
            assert_eq!(
                telegram,
                encode(Some(&announced), TimeValidity::Fresh),
                "cycle {}",
                n
            );
        }
    }

    #[test]
    fn test_slow_pulse_keeps_announced_second() {
        // 30 ppm slow: 108 ms behind the local tick after an hour
        drifting_train(1_000_030, MAX_RESYNC_INTERVAL_S as u64);
    }

    #[test]
    fn test_fast_pulse_keeps_announced_second() {
        drifting_train(999_970, MAX_RESYNC_INTERVAL_S as u64);
    }
}
