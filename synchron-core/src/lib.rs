//! Board-agnostic core logic for the IF482 telegram generator
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Calendar time samples and time validity
//! - IF482 telegram encoding
//! - Phase-locked telegram scheduling (bootstrap, wake computation, watchdog)
//! - Software clock anchored to the precision pulse
//! - Generator configuration and fault types
//! - Collaborator traits (time source, pulse source, status indicator)

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod status;
pub mod telegram;
pub mod time;
pub mod traits;

/// Monotonic tick count of the platform timer
///
/// All tick arithmetic is wrapping so the counter may roll over.
pub type Ticks = u64;
