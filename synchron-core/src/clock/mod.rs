//! Software clock anchored to the precision pulse
//!
//! The RTC is only read once in a while over I2C. Between reads, the time is
//! extrapolated on the local tick from the pulse edge the last read was
//! anchored to.

use crate::time::{TimeSample, TimeValidity, EPOCH};
use crate::traits::TimeSource;
use crate::Ticks;

/// Wall clock extrapolated from the last RTC read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SyncedClock {
    anchor: TimeSample,
    anchor_tick: Ticks,
    ticks_per_second: Ticks,
    validity: TimeValidity,
    last_sync: Option<Ticks>,
}

impl SyncedClock {
    /// Unset clock counting from [`EPOCH`] at `boot_tick`
    pub const fn new(boot_tick: Ticks, ticks_per_second: Ticks) -> Self {
        Self {
            anchor: EPOCH,
            anchor_tick: boot_tick,
            ticks_per_second: if ticks_per_second == 0 { 1 } else { ticks_per_second },
            validity: TimeValidity::Unset,
            last_sync: None,
        }
    }

    /// Anchor `sample` at `tick` and mark the clock fresh
    ///
    /// `tick` is the instant the sample's second began.
    pub fn sync(&mut self, sample: TimeSample, tick: Ticks) {
        self.anchor = sample;
        self.anchor_tick = tick;
        self.validity = TimeValidity::Fresh;
        self.last_sync = Some(tick);
    }

    /// Record a failed RTC read
    ///
    /// A fresh clock keeps running on its own and becomes stale; an unset
    /// clock stays unset.
    pub fn sync_failed(&mut self) {
        if self.validity == TimeValidity::Fresh {
            self.validity = TimeValidity::Stale;
        }
    }

    /// Mark the time as never set (RTC lost power)
    pub fn invalidate(&mut self) {
        self.validity = TimeValidity::Unset;
    }

    pub fn validity(&self) -> TimeValidity {
        self.validity
    }

    /// Tick of the last successful sync
    pub fn last_sync(&self) -> Option<Ticks> {
        self.last_sync
    }

    /// Time at `tick`
    ///
    /// Ticks before the anchor are allowed (the counter is read outside the
    /// lock). A result outside the representable calendar reads as unset.
    pub fn now_at(&self, tick: Ticks) -> (TimeSample, TimeValidity) {
        let delta = tick.wrapping_sub(self.anchor_tick) as i64;
        let elapsed = delta.div_euclid(self.ticks_per_second as i64);
        let seconds = self.anchor.epoch_seconds() as i64 + elapsed;

        if seconds < 0 {
            return (EPOCH, TimeValidity::Unset);
        }
        match TimeSample::from_epoch_seconds(seconds as u64) {
            Ok(sample) => (sample, self.validity),
            Err(_) => (EPOCH, TimeValidity::Unset),
        }
    }

    /// Freeze the clock at `tick` as a [`TimeSource`]
    pub fn at(&self, tick: Ticks) -> ClockReading {
        let (sample, validity) = self.now_at(tick);
        ClockReading { sample, validity }
    }
}

/// Clock value captured at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockReading {
    pub sample: TimeSample,
    pub validity: TimeValidity,
}

impl TimeSource for ClockReading {
    fn current_local_time(&self) -> (TimeSample, TimeValidity) {
        (self.sample, self.validity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::MAX_YEAR;

    const HZ: Ticks = 1_000_000;

    fn sample(h: u8, m: u8, s: u8) -> TimeSample {
        TimeSample::new(2023, 8, 6, h, m, s).unwrap()
    }

    #[test]
    fn test_new_clock_is_unset_epoch() {
        let clock = SyncedClock::new(500, HZ);
        assert_eq!(clock.now_at(500), (EPOCH, TimeValidity::Unset));
        assert_eq!(clock.now_at(500 + 2 * HZ).0.second(), 2);
        assert_eq!(clock.last_sync(), None);
    }

    #[test]
    fn test_sync_extrapolates_whole_seconds() {
        let mut clock = SyncedClock::new(0, HZ);
        clock.sync(sample(16, 3, 58), 10 * HZ);

        assert_eq!(clock.now_at(10 * HZ), (sample(16, 3, 58), TimeValidity::Fresh));
        assert_eq!(clock.now_at(11 * HZ - 1).0, sample(16, 3, 58));
        assert_eq!(clock.now_at(11 * HZ).0, sample(16, 3, 59));
        assert_eq!(clock.now_at(12 * HZ).0, sample(16, 4, 0));
    }

    #[test]
    fn test_tick_before_anchor() {
        let mut clock = SyncedClock::new(0, HZ);
        clock.sync(sample(16, 4, 0), 10 * HZ);
        assert_eq!(clock.now_at(10 * HZ - 1).0, sample(16, 3, 59));
    }

    #[test]
    fn test_anchor_across_wraparound() {
        let mut clock = SyncedClock::new(0, HZ);
        let anchor = u64::MAX - HZ / 2;
        clock.sync(sample(23, 59, 59), anchor);

        let (now, validity) = clock.now_at(anchor.wrapping_add(HZ));
        assert_eq!(now, TimeSample::new(2023, 8, 7, 0, 0, 0).unwrap());
        assert_eq!(validity, TimeValidity::Fresh);
    }

    #[test]
    fn test_validity_transitions() {
        let mut clock = SyncedClock::new(0, HZ);
        clock.sync_failed();
        assert_eq!(clock.validity(), TimeValidity::Unset);

        clock.sync(sample(12, 0, 0), 0);
        assert_eq!(clock.validity(), TimeValidity::Fresh);

        clock.sync_failed();
        assert_eq!(clock.validity(), TimeValidity::Stale);
        assert_eq!(clock.now_at(HZ).1, TimeValidity::Stale);

        clock.sync(sample(12, 0, 5), 5 * HZ);
        assert_eq!(clock.validity(), TimeValidity::Fresh);

        clock.invalidate();
        assert_eq!(clock.validity(), TimeValidity::Unset);
    }

    #[test]
    fn test_out_of_range_reads_unset() {
        let mut clock = SyncedClock::new(0, HZ);
        clock.sync(TimeSample::new(MAX_YEAR, 12, 31, 23, 59, 59).unwrap(), 0);
        assert_eq!(clock.now_at(HZ), (EPOCH, TimeValidity::Unset));

        clock.sync(EPOCH, 10 * HZ);
        assert_eq!(clock.now_at(9 * HZ), (EPOCH, TimeValidity::Unset));
    }

    #[test]
    fn test_reading_as_time_source() {
        let mut clock = SyncedClock::new(0, HZ);
        clock.sync(sample(16, 3, 59), 0);
        let reading = clock.at(HZ / 2);
        assert_eq!(
            reading.current_local_time(),
            (sample(16, 3, 59), TimeValidity::Fresh)
        );
    }
}
