//! Status display

use crate::status::GeneratorStatus;

/// Anything that can show the generator status to a human
pub trait StatusIndicator {
    /// Switch to the indication for `status`
    fn show(&mut self, status: GeneratorStatus);
}
