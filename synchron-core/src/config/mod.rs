//! Generator configuration
//!
//! The firmware embeds a TOML file that is validated and compiled into a
//! [`GeneratorConfig`] constant at build time. [`GeneratorConfig::validate`]
//! runs again at start-up before anything is armed.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use synchron_hal::UartConfig;

use crate::error::ConfigurationFault;
use crate::telegram::{self, MONITOR_FRESH, MONITOR_STALE, MONITOR_UNSET};

/// Pulse period in milliseconds (one telegram per second)
pub const PULSE_PERIOD_MS: u32 = 1000;

/// Minimum bootstrap window: the time source must tick within it
pub const MIN_BOOTSTRAP_TIMEOUT_MS: u32 = 2000;

/// Longest resync interval
///
/// The telegram second is read half a period after each pulse, so the
/// local tick may drift up to half a period from the pulse between resyncs.
/// One hour allows 138 ppm.
pub const MAX_RESYNC_INTERVAL_S: u32 = 3600;

/// Where the 1 Hz reference comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PulseSourceKind {
    /// Square-wave output of an external RTC (±2 ppm)
    #[default]
    Rtc,
    /// On-chip hardware timer (crystal accuracy only)
    Timer,
}

/// Generator configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct GeneratorConfig {
    /// Serial baud rate (frame format is fixed at 7E1)
    pub baudrate: u32,
    /// Pulse source
    pub pulse_source: PulseSourceKind,
    /// Watchdog window as a percentage of the pulse period
    pub watchdog_percent: u16,
    /// Maximum tolerated wake-up lateness in milliseconds
    pub jitter_budget_ms: u32,
    /// Bootstrap deadline in milliseconds
    pub bootstrap_timeout_ms: u32,
    /// Interval between time source resynchronizations in seconds
    pub resync_interval_s: u32,
    /// Monitor byte sent while time has never been set
    pub unset_monitor: char,
}

impl GeneratorConfig {
    /// IF482 defaults: 9600 baud, RTC pulse, 1.5 period watchdog, 50 ms jitter
    pub const IF482: Self = Self {
        baudrate: telegram::DEFAULT_BAUDRATE,
        pulse_source: PulseSourceKind::Rtc,
        watchdog_percent: 150,
        jitter_budget_ms: 50,
        bootstrap_timeout_ms: 3000,
        resync_interval_s: 60,
        unset_monitor: MONITOR_UNSET as char,
    };

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigurationFault> {
        if self.baudrate == 0 {
            return Err(ConfigurationFault::InvalidBaudrate);
        }
        if self.watchdog_percent <= 100 {
            return Err(ConfigurationFault::InvalidWatchdog);
        }
        if self.jitter_budget_ms == 0 || self.jitter_budget_ms >= PULSE_PERIOD_MS {
            return Err(ConfigurationFault::InvalidJitterBudget);
        }
        if self.bootstrap_timeout_ms < MIN_BOOTSTRAP_TIMEOUT_MS {
            return Err(ConfigurationFault::InvalidBootstrapTimeout);
        }
        if self.resync_interval_s == 0 || self.resync_interval_s > MAX_RESYNC_INTERVAL_S {
            return Err(ConfigurationFault::InvalidResyncInterval);
        }

        let sentinel = self.unset_monitor;
        if !sentinel.is_ascii_graphic()
            || sentinel == MONITOR_FRESH as char
            || sentinel == MONITOR_STALE as char
        {
            return Err(ConfigurationFault::InvalidSentinel);
        }

        Ok(())
    }

    /// Serial configuration for the telegram transport
    pub fn serial_config(&self) -> UartConfig {
        telegram::serial_config(self.baudrate)
    }

    /// Unset-time monitor byte
    ///
    /// Only meaningful after [`validate`](Self::validate) accepted the config.
    pub fn unset_monitor_byte(&self) -> u8 {
        if self.unset_monitor.is_ascii() {
            self.unset_monitor as u8
        } else {
            MONITOR_UNSET
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::IF482
    }
}
