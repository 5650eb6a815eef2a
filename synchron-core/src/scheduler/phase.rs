//! Phase lock between the reference pulse and the transmit instant
//!
//! A pulse at tick `p` marks the start of second `S`. The telegram for
//! `S + 1` must finish at `p + period`, so transmission starts at
//! `p + period - lead`, where `lead` is the time needed to clock out one
//! telegram. Wake instants are derived from pulse ticks only, never from
//! the previous wake-up, so there is no cumulative drift.

use synchron_hal::UartConfig;

use crate::error::ConfigurationFault;
use crate::Ticks;

/// Ticks needed to transmit `chars` characters, rounded to the nearest tick
pub fn lead_ticks(config: &UartConfig, chars: usize, tick_hz: u64) -> Ticks {
    let bits = chars as u64 * config.bits_per_char() as u64;
    let baud = config.baudrate.max(1) as u64;
    (bits * tick_hz + baud / 2) / baud
}

/// Convert milliseconds to ticks
pub fn ms_to_ticks(ms: u32, tick_hz: u64) -> Ticks {
    ms as u64 * tick_hz / 1000
}

/// Classification of an incoming pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PulseVerdict {
    /// First pulse after bootstrap
    First,
    /// One period after the previous pulse
    OnTime,
    /// Arrived after this many periods went without a pulse
    Missed(u32),
    /// Closer than half a period to the previous pulse
    Spurious,
}

/// Phase state owned by the scheduler
#[derive(Debug, Clone)]
pub struct PhaseLock {
    /// Second boundary observed during bootstrap
    baseline: Ticks,
    /// Pulse period
    period: Ticks,
    /// Telegram transmission time
    lead: Ticks,
    /// Most recent accepted pulse
    last_pulse: Option<Ticks>,
}

impl PhaseLock {
    pub fn new(baseline: Ticks, period: Ticks, lead: Ticks) -> Result<Self, ConfigurationFault> {
        if lead >= period {
            return Err(ConfigurationFault::LeadExceedsPeriod);
        }

        Ok(Self {
            baseline,
            period,
            lead,
            last_pulse: None,
        })
    }

    pub fn period(&self) -> Ticks {
        self.period
    }

    pub fn lead(&self) -> Ticks {
        self.lead
    }

    pub fn baseline(&self) -> Ticks {
        self.baseline
    }

    pub fn last_pulse(&self) -> Option<Ticks> {
        self.last_pulse
    }

    /// Transmit instant for the second following `pulse`
    pub fn wake_tick(&self, pulse: Ticks) -> Ticks {
        pulse.wrapping_add(self.period - self.lead)
    }

    /// Classify a pulse and remember it unless spurious
    pub fn accept_pulse(&mut self, pulse: Ticks) -> PulseVerdict {
        let verdict = match self.last_pulse {
            None => PulseVerdict::First,
            Some(last) => {
                let delta = pulse.wrapping_sub(last);
                if delta < self.period / 2 {
                    return PulseVerdict::Spurious;
                }
                let periods = (delta + self.period / 2) / self.period;
                match periods {
                    0 | 1 => PulseVerdict::OnTime,
                    n => PulseVerdict::Missed((n - 1).min(u32::MAX as u64) as u32),
                }
            }
        };

        self.last_pulse = Some(pulse);
        verdict
    }

    /// Offset of a pulse after the bootstrap boundary, modulo one period
    ///
    /// Shows how far the time source's second boundary sits from the
    /// hardware pulse.
    pub fn boundary_offset(&self, pulse: Ticks) -> Ticks {
        pulse.wrapping_sub(self.baseline) % self.period
    }
}
