//! Generator fault taxonomy
//!
//! Configuration and task-creation faults are fatal at start-up. Pulse loss
//! is recoverable and reported while the generator keeps running. Invalid
//! time is not an error at all; it is carried by `TimeValidity`.

/// Fault preventing the generator from being armed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigurationFault {
    /// Baud rate is zero
    InvalidBaudrate,
    /// Watchdog window does not exceed one pulse period
    InvalidWatchdog,
    /// Jitter budget is zero or not below one pulse period
    InvalidJitterBudget,
    /// Bootstrap timeout shorter than two seconds
    InvalidBootstrapTimeout,
    /// Resync interval is zero or longer than one hour
    InvalidResyncInterval,
    /// Unset-time monitor byte is not printable or collides with 'A'/'M'
    InvalidSentinel,
    /// Transmitting one telegram takes at least one pulse period
    LeadExceedsPeriod,
    /// Pulse source cannot produce the requested rate
    UnsupportedPulseRate,
    /// Shared bus to the pulse source could not be locked
    BusBusy,
    /// Pulse source did not respond
    PulseSourceUnavailable,
    /// Time source never crossed a second boundary during bootstrap
    ClockStalled,
}

/// Generator fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// Generator could not be configured
    Configuration(ConfigurationFault),
    /// Scheduler task could not be started
    TaskCreation,
    /// No pulse arrived within the watchdog window
    PulseLost,
}

impl From<ConfigurationFault> for Fault {
    fn from(fault: ConfigurationFault) -> Self {
        Fault::Configuration(fault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_fault_converts() {
        assert_eq!(
            Fault::from(ConfigurationFault::BusBusy),
            Fault::Configuration(ConfigurationFault::BusBusy)
        );
        assert_ne!(Fault::from(ConfigurationFault::BusBusy), Fault::PulseLost);
    }
}
