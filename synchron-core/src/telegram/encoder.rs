//! Telegram encoding
//!
//! Pure and allocation-free; safe to call from any task.

use core::ops::Deref;

use super::{
    END_BYTE, FALLBACK_DIGITS, MONITOR_FRESH, MONITOR_STALE, MONITOR_UNSET, SEASON_LOCAL,
    START_BYTE, TELEGRAM_LEN,
};
use crate::time::{TimeSample, TimeValidity};

/// Offset of the first date/time digit
const DIGITS_START: usize = 3;

/// Offset of the terminator
const END_OFFSET: usize = TELEGRAM_LEN - 1;

/// An encoded IF482 telegram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Telegram([u8; TELEGRAM_LEN]);

impl Telegram {
    /// Raw telegram bytes, ready for the transport
    pub fn as_bytes(&self) -> &[u8; TELEGRAM_LEN] {
        &self.0
    }

    /// Monitor byte
    pub fn monitor(&self) -> u8 {
        self.0[1]
    }

    /// Season byte
    pub fn season(&self) -> u8 {
        self.0[2]
    }

    /// Date/time region including the weekday digit
    pub fn digits(&self) -> &[u8] {
        &self.0[DIGITS_START..END_OFFSET]
    }

    /// Telegram as text, including the trailing CR
    pub fn as_str(&self) -> &str {
        // Every byte written by the encoder is ASCII
        core::str::from_utf8(&self.0).unwrap_or("")
    }
}

impl Deref for Telegram {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Telegram {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.as_str().trim_end())
    }
}

/// Encode a telegram using the default `'?'` sentinel for unset time
///
/// With `Fresh` or `Stale` validity the sample's fields are written
/// zero-padded. With `Unset` validity, or when no sample is supplied, the
/// fallback digit pattern is written instead.
pub fn encode(sample: Option<&TimeSample>, validity: TimeValidity) -> Telegram {
    encode_with_sentinel(sample, validity, MONITOR_UNSET)
}

/// Encode a telegram with a custom monitor byte for unset time
pub fn encode_with_sentinel(
    sample: Option<&TimeSample>,
    validity: TimeValidity,
    unset_monitor: u8,
) -> Telegram {
    let mut out = [0u8; TELEGRAM_LEN];

    out[0] = START_BYTE;
    out[1] = match validity {
        TimeValidity::Fresh => MONITOR_FRESH,
        TimeValidity::Stale => MONITOR_STALE,
        TimeValidity::Unset => unset_monitor,
    };
    out[2] = SEASON_LOCAL;

    match sample {
        Some(t) if validity.is_confident() => {
            put_two_digits(&mut out[3..5], (t.year() % 100) as u8);
            put_two_digits(&mut out[5..7], t.month());
            put_two_digits(&mut out[7..9], t.day());
            out[9] = b'0' + t.weekday();
            put_two_digits(&mut out[10..12], t.hour());
            put_two_digits(&mut out[12..14], t.minute());
            put_two_digits(&mut out[14..16], t.second());
        }
        _ => out[DIGITS_START..END_OFFSET].copy_from_slice(FALLBACK_DIGITS),
    }

    out[END_OFFSET] = END_BYTE;
    Telegram(out)
}

fn put_two_digits(dst: &mut [u8], value: u8) {
    dst[0] = b'0' + value / 10;
    dst[1] = b'0' + value % 10;
}
