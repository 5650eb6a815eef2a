//! Collaborator traits
//!
//! These traits define the interface between the generator logic and the
//! subsystems it consumes but does not implement.

pub mod pulse;
pub mod status;
pub mod time;

pub use pulse::PulseSource;
pub use status::StatusIndicator;
pub use time::TimeSource;
