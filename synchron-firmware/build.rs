//! Build script for synchron-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates generator.toml and compiles it into a constant

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use synchron_core::config::{GeneratorConfig, PulseSourceKind};
use synchron_core::scheduler::SchedulerTiming;

/// Tick rate of the embassy-rp time driver
const TICK_HZ: u64 = 1_000_000;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    generator: GeneratorConfig,
}

fn main() {
    setup_linker();
    let config = load_config();
    write_config(&config);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Read and validate generator.toml
fn load_config() -> GeneratorConfig {
    println!("cargo:rerun-if-changed=generator.toml");

    let config_path = Path::new("generator.toml");
    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: generator.toml not found!                                ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a generator.toml configuration file.      ║\n\
            ║  Please create one in the synchron-firmware directory.           ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read generator.toml", &e.to_string()),
    };

    let file: ConfigFile = match toml::from_str(&content) {
        Ok(file) => file,
        Err(e) => fail("Invalid generator.toml", &e.to_string()),
    };
    let config = file.generator;

    if let Err(fault) = config.validate() {
        fail("Invalid value in generator.toml", &format!("{:?}", fault));
    }
    if let Err(fault) = SchedulerTiming::from_config(&config, TICK_HZ) {
        fail(
            "generator.toml timing cannot work",
            &format!("{:?} at {} baud", fault, config.baudrate),
        );
    }

    println!("cargo:warning=generator.toml validated successfully");
    config
}

/// Emit `GENERATOR_CONFIG` into OUT_DIR
fn write_config(config: &GeneratorConfig) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let pulse_source = match config.pulse_source {
        PulseSourceKind::Rtc => "PulseSourceKind::Rtc",
        PulseSourceKind::Timer => "PulseSourceKind::Timer",
    };

    let code = format!(
        "/// Configuration compiled from generator.toml\n\
         pub const GENERATOR_CONFIG: GeneratorConfig = GeneratorConfig {{\n    \
             baudrate: {},\n    \
             pulse_source: {},\n    \
             watchdog_percent: {},\n    \
             jitter_budget_ms: {},\n    \
             bootstrap_timeout_ms: {},\n    \
             resync_interval_s: {},\n    \
             unset_monitor: {:?},\n\
         }};\n",
        config.baudrate,
        pulse_source,
        config.watchdog_percent,
        config.jitter_budget_ms,
        config.bootstrap_timeout_ms,
        config.resync_interval_s,
        config.unset_monitor,
    );

    fs::write(out_dir.join("generator_config.rs"), code).unwrap();
}

/// Abort the build with a boxed error message
fn fail(title: &str, detail: &str) -> ! {
    let lines = detail
        .lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n");

    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<58} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title, lines
    );
}
