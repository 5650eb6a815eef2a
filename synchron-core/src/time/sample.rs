//! Calendar time samples
//!
//! A [`TimeSample`] is an immutable local-time snapshot. Weekdays follow
//! the IF482 convention: Monday = 1 through Sunday = 7.
//!
//! Calendar arithmetic uses day counts relative to the Unix epoch
//! (proleptic Gregorian calendar), which keeps [`TimeSample::add_seconds`]
//! constant-time regardless of the distance advanced.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// First year a sample may carry
pub const MIN_YEAR: u16 = 2000;

/// Last year a sample may carry (DS3231 century bit covers 2000-2199)
pub const MAX_YEAR: u16 = 2199;

/// Days from 1970-01-01 to 2000-01-01
const DAYS_TO_MIN_YEAR: i64 = 10_957;

const SECONDS_PER_DAY: u64 = 86_400;

/// 2000-01-01 00:00:00, a Saturday
pub const EPOCH: TimeSample = TimeSample {
    year: MIN_YEAR,
    month: 1,
    day: 1,
    weekday: 6,
    hour: 0,
    minute: 0,
    second: 0,
};

/// Errors from constructing or advancing a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeError {
    /// Year outside `MIN_YEAR..=MAX_YEAR`
    InvalidYear,
    /// Month outside 1-12
    InvalidMonth,
    /// Day outside the month
    InvalidDay,
    /// Weekday outside 1-7
    InvalidWeekday,
    /// Hour outside 0-23
    InvalidHour,
    /// Minute outside 0-59
    InvalidMinute,
    /// Second outside 0-59
    InvalidSecond,
}

/// Local time snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeSample {
    year: u16,
    month: u8,
    day: u8,
    weekday: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl TimeSample {
    /// Create a sample, deriving the weekday from the date
    pub fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, TimeError> {
        validate_date(year, month, day)?;
        validate_time(hour, minute, second)?;

        Ok(Self {
            year,
            month,
            day,
            weekday: weekday_from_days(days_from_civil(year, month, day)),
            hour,
            minute,
            second,
        })
    }

    /// Create a sample with a weekday supplied by the time source
    ///
    /// The weekday is range-checked but not cross-checked against the date.
    #[allow(clippy::too_many_arguments)]
    pub fn with_weekday(
        year: u16,
        month: u8,
        day: u8,
        weekday: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, TimeError> {
        validate_date(year, month, day)?;
        validate_time(hour, minute, second)?;
        if !(1..=7).contains(&weekday) {
            return Err(TimeError::InvalidWeekday);
        }

        Ok(Self {
            year,
            month,
            day,
            weekday,
            hour,
            minute,
            second,
        })
    }

    /// Create a sample from seconds elapsed since [`EPOCH`]
    pub fn from_epoch_seconds(seconds: u64) -> Result<Self, TimeError> {
        let days = seconds / SECONDS_PER_DAY;
        let rem = seconds % SECONDS_PER_DAY;

        // Bound before the i64 conversion; MAX_YEAR is far below this
        if days > 200 * 366 {
            return Err(TimeError::InvalidYear);
        }

        let unix_days = DAYS_TO_MIN_YEAR + days as i64;
        let (year, month, day) = civil_from_days(unix_days);
        if year > MAX_YEAR as i64 {
            return Err(TimeError::InvalidYear);
        }

        Ok(Self {
            year: year as u16,
            month,
            day,
            weekday: weekday_from_days(unix_days),
            hour: (rem / 3600) as u8,
            minute: ((rem / 60) % 60) as u8,
            second: (rem % 60) as u8,
        })
    }

    /// Seconds elapsed since [`EPOCH`]
    pub fn epoch_seconds(&self) -> u64 {
        let days = (days_from_civil(self.year, self.month, self.day) - DAYS_TO_MIN_YEAR) as u64;
        days * SECONDS_PER_DAY
            + self.hour as u64 * 3600
            + self.minute as u64 * 60
            + self.second as u64
    }

    /// Advance by a number of seconds, rolling over the calendar
    ///
    /// The weekday of the result is derived from its date.
    pub fn add_seconds(&self, seconds: u64) -> Result<Self, TimeError> {
        let target = self
            .epoch_seconds()
            .checked_add(seconds)
            .ok_or(TimeError::InvalidYear)?;
        Self::from_epoch_seconds(target)
    }

    /// The sample one second later
    pub fn next_second(&self) -> Result<Self, TimeError> {
        self.add_seconds(1)
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    /// Day of week, Monday = 1 through Sunday = 7
    pub fn weekday(&self) -> u8 {
        self.weekday
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }
}

/// Whether `year` is a Gregorian leap year
pub fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in a month
pub fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

fn validate_date(year: u16, month: u8, day: u8) -> Result<(), TimeError> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(TimeError::InvalidYear);
    }
    if !(1..=12).contains(&month) {
        return Err(TimeError::InvalidMonth);
    }
    if day == 0 || day > days_in_month(year, month) {
        return Err(TimeError::InvalidDay);
    }
    Ok(())
}

fn validate_time(hour: u8, minute: u8, second: u8) -> Result<(), TimeError> {
    if hour > 23 {
        return Err(TimeError::InvalidHour);
    }
    if minute > 59 {
        return Err(TimeError::InvalidMinute);
    }
    if second > 59 {
        return Err(TimeError::InvalidSecond);
    }
    Ok(())
}

/// Days since 1970-01-01 for a civil date
fn days_from_civil(year: u16, month: u8, day: u8) -> i64 {
    let m = month as i64;
    let y = year as i64 - if m <= 2 { 1 } else { 0 };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = if m > 2 { m - 3 } else { m + 9 };
    let doy = (153 * mp + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Civil date for a count of days since 1970-01-01
fn civil_from_days(days: i64) -> (i64, u8, u8) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}

/// ISO weekday (Monday = 1) for a count of days since 1970-01-01 (a Thursday)
fn weekday_from_days(days: i64) -> u8 {
    ((days + 3).rem_euclid(7) + 1) as u8
}
