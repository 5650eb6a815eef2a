//! DS3231 real-time clock (I2C)
//!
//! The DS3231 is a temperature-compensated RTC with a programmable square
//! wave output on its INT/SQW pin. The generator uses it twice: as the
//! wall-clock time source, and, with the pin in square-wave mode at 1 Hz,
//! as the precision pulse that triggers every telegram.
//!
//! # Register map (subset)
//!
//! - 0x00-0x06: seconds, minutes, hours, day, date, month/century, year (BCD)
//! - 0x0E: control (EOSC, INTCN, RS2:RS1, alarm enables)
//! - 0x0F: status (OSF, EN32kHz, busy, alarm flags)
//!
//! The SQW output falls on every seconds-register update, so the falling
//! edge marks the start of a new second.

use embedded_hal::i2c::I2c;
use synchron_core::error::ConfigurationFault;
use synchron_core::time::{TimeError, TimeSample};
use synchron_core::traits::PulseSource;

/// Fixed 7-bit I2C address
pub const DS3231_ADDR: u8 = 0x68;

/// DS3231 register addresses
pub mod reg {
    pub const SECONDS: u8 = 0x00;
    pub const MINUTES: u8 = 0x01;
    pub const HOURS: u8 = 0x02;
    pub const DAY: u8 = 0x03;
    pub const DATE: u8 = 0x04;
    pub const MONTH: u8 = 0x05;
    pub const YEAR: u8 = 0x06;
    pub const CONTROL: u8 = 0x0E;
    pub const STATUS: u8 = 0x0F;
}

/// Register bit masks
pub mod bits {
    /// Hours register: 12-hour mode
    pub const HOURS_12H: u8 = 1 << 6;
    /// Hours register: PM in 12-hour mode
    pub const HOURS_PM: u8 = 1 << 5;
    /// Month register: century rollover
    pub const MONTH_CENTURY: u8 = 1 << 7;
    /// Control: interrupt (1) or square wave (0) on INT/SQW
    pub const CONTROL_INTCN: u8 = 1 << 2;
    /// Control: square wave rate select
    pub const CONTROL_RS1: u8 = 1 << 3;
    pub const CONTROL_RS2: u8 = 1 << 4;
    /// Control: oscillator disabled on battery
    pub const CONTROL_EOSC: u8 = 1 << 7;
    /// Status: oscillator was stopped, time is invalid
    pub const STATUS_OSF: u8 = 1 << 7;
}

/// Square wave output rates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SquareWaveRate {
    Hz1,
    Hz1024,
    Hz4096,
    Hz8192,
}

impl SquareWaveRate {
    /// Rate for a frequency the chip supports
    pub fn from_hz(hz: u32) -> Option<Self> {
        match hz {
            1 => Some(Self::Hz1),
            1024 => Some(Self::Hz1024),
            4096 => Some(Self::Hz4096),
            8192 => Some(Self::Hz8192),
            _ => None,
        }
    }

    /// RS2:RS1 bits in the control register
    pub fn control_bits(&self) -> u8 {
        match self {
            Self::Hz1 => 0,
            Self::Hz1024 => bits::CONTROL_RS1,
            Self::Hz4096 => bits::CONTROL_RS2,
            Self::Hz8192 => bits::CONTROL_RS2 | bits::CONTROL_RS1,
        }
    }
}

/// DS3231 errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ds3231Error {
    /// I2C transfer failed
    Bus,
    /// Time registers hold an impossible value
    InvalidTime(TimeError),
}

impl From<Ds3231Error> for ConfigurationFault {
    fn from(_: Ds3231Error) -> Self {
        ConfigurationFault::PulseSourceUnavailable
    }
}

/// Decode a packed BCD byte
pub fn bcd_to_bin(bcd: u8) -> u8 {
    (bcd >> 4) * 10 + (bcd & 0x0F)
}

/// Decode the seven time registers starting at `reg::SECONDS`
///
/// The day-of-week register is user-defined on the DS3231, so the weekday
/// is derived from the date instead.
pub fn decode_time(regs: &[u8; 7]) -> Result<TimeSample, TimeError> {
    let second = bcd_to_bin(regs[0] & 0x7F);
    let minute = bcd_to_bin(regs[1] & 0x7F);

    let raw_hour = regs[2];
    let hour = if raw_hour & bits::HOURS_12H != 0 {
        let h12 = bcd_to_bin(raw_hour & 0x1F) % 12;
        if raw_hour & bits::HOURS_PM != 0 {
            h12 + 12
        } else {
            h12
        }
    } else {
        bcd_to_bin(raw_hour & 0x3F)
    };

    let day = bcd_to_bin(regs[4] & 0x3F);
    let month = bcd_to_bin(regs[5] & 0x1F);
    let century: u16 = if regs[5] & bits::MONTH_CENTURY != 0 { 100 } else { 0 };
    let year = 2000 + century + bcd_to_bin(regs[6]) as u16;

    TimeSample::new(year, month, day, hour, minute, second)
}

/// DS3231 driver
pub struct Ds3231<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> Ds3231<I2C> {
    /// Create a new driver on the given bus
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Give the bus back
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn read_registers(&mut self, start: u8, buf: &mut [u8]) -> Result<(), Ds3231Error> {
        self.i2c
            .write_read(DS3231_ADDR, &[start], buf)
            .map_err(|_| Ds3231Error::Bus)
    }

    fn read_register(&mut self, register: u8) -> Result<u8, Ds3231Error> {
        let mut value = [0u8];
        self.read_registers(register, &mut value)?;
        Ok(value[0])
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Ds3231Error> {
        self.i2c
            .write(DS3231_ADDR, &[register, value])
            .map_err(|_| Ds3231Error::Bus)
    }

    /// Read the current time in one burst
    pub fn read_time(&mut self) -> Result<TimeSample, Ds3231Error> {
        let mut regs = [0u8; 7];
        self.read_registers(reg::SECONDS, &mut regs)?;
        decode_time(&regs).map_err(Ds3231Error::InvalidTime)
    }

    /// Whether the oscillator stopped since the flag was last cleared
    ///
    /// Set after power loss; the time registers are meaningless until the
    /// clock is set again.
    pub fn oscillator_stopped(&mut self) -> Result<bool, Ds3231Error> {
        Ok(self.read_register(reg::STATUS)? & bits::STATUS_OSF != 0)
    }

    /// Switch INT/SQW to square-wave output at `rate`
    ///
    /// Alarm enables and the oscillator bit are left untouched.
    pub fn enable_square_wave(&mut self, rate: SquareWaveRate) -> Result<(), Ds3231Error> {
        let control = self.read_register(reg::CONTROL)?;
        let control = (control
            & !(bits::CONTROL_INTCN | bits::CONTROL_RS1 | bits::CONTROL_RS2 | bits::CONTROL_EOSC))
            | rate.control_bits();
        self.write_register(reg::CONTROL, control)
    }
}

impl<I2C: I2c> PulseSource for Ds3231<I2C> {
    fn configure(&mut self, period_hz: u32) -> Result<(), ConfigurationFault> {
        let rate =
            SquareWaveRate::from_hz(period_hz).ok_or(ConfigurationFault::UnsupportedPulseRate)?;
        self.enable_square_wave(rate)?;
        Ok(())
    }
}
