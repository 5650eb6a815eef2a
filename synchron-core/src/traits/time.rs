//! Wall-clock time source

use crate::time::{TimeSample, TimeValidity};

/// Supplier of the current local time
///
/// Time-zone conversion, if any, has already been applied.
pub trait TimeSource {
    /// Current local time and its validity
    fn current_local_time(&self) -> (TimeSample, TimeValidity);
}
