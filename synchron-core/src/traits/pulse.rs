//! Precision pulse source

use crate::error::ConfigurationFault;

/// Hardware that emits one edge per period
///
/// Configured once at start-up. The edge itself is delivered to the
/// registered interrupt handler, not through this trait.
pub trait PulseSource {
    /// Arm the periodic pulse at `period_hz`
    fn configure(&mut self, period_hz: u32) -> Result<(), ConfigurationFault>;
}
