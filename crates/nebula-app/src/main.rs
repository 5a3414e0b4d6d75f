//! Headless entry point: loads config, sets up logging and runs the world loop.

use std::time::Duration;

use clap::Parser;
use nebula_app::{PlatformDirs, run_headless};
use nebula_config::{CliArgs, Config};

/// Sleep between frames, roughly 60 Hz.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

fn main() {
    let args = CliArgs::parse();

    let dirs = match args.config.as_deref() {
        Some(dir) => PlatformDirs::with_config_dir(dir),
        None => match PlatformDirs::resolve() {
            Ok(dirs) => dirs,
            Err(e) => {
                eprintln!("Failed to resolve platform directories: {e}");
                std::process::exit(1);
            }
        },
    };
    if let Err(e) = dirs.create_dirs() {
        eprintln!("Failed to initialize platform directories: {e}");
        std::process::exit(1);
    }

    let mut config = match Config::load_or_create(&dirs.config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config, using defaults: {e}");
            Config::default()
        }
    };
    config.apply_cli_overrides(&args);
    if let Err(e) = config.validate() {
        eprintln!("{e}");
        std::process::exit(1);
    }

    nebula_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));
    tracing::info!("Config directory: {}", dirs.config_dir.display());

    if let Err(e) = run_headless(&config, args.frames, FRAME_INTERVAL) {
        tracing::error!("Run failed: {e}");
        std::process::exit(1);
    }
}
