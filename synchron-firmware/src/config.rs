//! Generator configuration
//!
//! Edit generator.toml and rebuild to customize; build.rs rejects values
//! the generator cannot run with.

use synchron_core::config::{GeneratorConfig, PulseSourceKind};

include!(concat!(env!("OUT_DIR"), "/generator_config.rs"));
