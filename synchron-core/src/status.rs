//! Generator status as shown on the indicator

/// Generator status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GeneratorStatus {
    /// Waiting for the first second boundary
    Starting,
    /// Telegrams are being sent
    Running,
    /// Reference pulse missing, generator waiting for it
    PulseLost,
    /// Fatal start-up fault, generator not running
    Fault,
}

/// On/off durations for an indicator LED
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlinkPattern {
    /// Time on in milliseconds
    pub on_ms: u32,
    /// Time off in milliseconds
    pub off_ms: u32,
}

impl BlinkPattern {
    pub const OFF: Self = Self { on_ms: 0, off_ms: 1000 };
    pub const SOLID: Self = Self { on_ms: 1000, off_ms: 0 };

    /// Length of one on/off cycle
    pub fn cycle_ms(&self) -> u32 {
        self.on_ms + self.off_ms
    }

    /// Whether the LED is lit `elapsed_ms` into the pattern
    pub fn is_on_at(&self, elapsed_ms: u32) -> bool {
        let cycle = self.cycle_ms();
        if cycle == 0 {
            return false;
        }
        elapsed_ms % cycle < self.on_ms
    }
}

impl GeneratorStatus {
    /// Indicator pattern for this status
    pub fn pattern(&self) -> BlinkPattern {
        match self {
            GeneratorStatus::Starting => BlinkPattern::OFF,
            // One short flash per second, like the telegram cadence
            GeneratorStatus::Running => BlinkPattern {
                on_ms: 100,
                off_ms: 900,
            },
            GeneratorStatus::PulseLost => BlinkPattern {
                on_ms: 100,
                off_ms: 100,
            },
            GeneratorStatus::Fault => BlinkPattern::SOLID,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_pattern() {
        let p = GeneratorStatus::Running.pattern();
        assert!(p.is_on_at(0));
        assert!(p.is_on_at(99));
        assert!(!p.is_on_at(100));
        assert!(!p.is_on_at(999));
        assert!(p.is_on_at(1000));
    }

    #[test]
    fn test_solid_and_off() {
        assert!(GeneratorStatus::Fault.pattern().is_on_at(12_345));
        assert!(!GeneratorStatus::Starting.pattern().is_on_at(12_345));
    }

    #[test]
    fn test_zero_cycle_is_dark() {
        let p = BlinkPattern { on_ms: 0, off_ms: 0 };
        assert!(!p.is_on_at(0));
    }
}
