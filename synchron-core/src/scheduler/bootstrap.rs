//! Initial phase alignment
//!
//! Before the first pulse is trusted, the time source is polled until its
//! second value changes. The tick at that moment approximates the second
//! boundary and becomes the phase baseline.

use crate::error::ConfigurationFault;
use crate::Ticks;

/// Second-boundary detector
#[derive(Debug, Clone)]
pub struct Bootstrap {
    start: Ticks,
    timeout: Ticks,
    first_second: Option<u8>,
}

impl Bootstrap {
    /// Start detecting at `start`, failing after `timeout` ticks
    pub fn new(start: Ticks, timeout: Ticks) -> Self {
        Self {
            start,
            timeout,
            first_second: None,
        }
    }

    /// Feed one poll of the time source
    ///
    /// Returns the boundary tick once the second value differs from the
    /// first poll, `None` while still waiting.
    pub fn poll(&mut self, second: u8, now: Ticks) -> Result<Option<Ticks>, ConfigurationFault> {
        match self.first_second {
            None => {
                self.first_second = Some(second);
                Ok(None)
            }
            Some(first) if first != second => Ok(Some(now)),
            Some(_) => {
                if now.wrapping_sub(self.start) > self.timeout {
                    Err(ConfigurationFault::ClockStalled)
                } else {
                    Ok(None)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_boundary() {
        let mut b = Bootstrap::new(1000, 3000);
        assert_eq!(b.poll(10, 1000), Ok(None));
        assert_eq!(b.poll(10, 1500), Ok(None));
        assert_eq!(b.poll(11, 1742), Ok(Some(1742)));
    }

    #[test]
    fn test_minute_rollover_counts_as_boundary() {
        let mut b = Bootstrap::new(0, 3000);
        assert_eq!(b.poll(59, 0), Ok(None));
        assert_eq!(b.poll(0, 10), Ok(Some(10)));
    }

    #[test]
    fn test_stalled_clock_is_fatal() {
        let mut b = Bootstrap::new(0, 3000);
        assert_eq!(b.poll(5, 0), Ok(None));
        assert_eq!(b.poll(5, 3000), Ok(None));
        assert_eq!(b.poll(5, 3001), Err(ConfigurationFault::ClockStalled));
    }

    #[test]
    fn test_wrapping_start() {
        let start = u64::MAX - 100;
        let mut b = Bootstrap::new(start, 3000);
        assert_eq!(b.poll(1, start), Ok(None));
        assert_eq!(b.poll(1, 50), Ok(None));
        assert_eq!(b.poll(2, 60), Ok(Some(60)));
    }
}
