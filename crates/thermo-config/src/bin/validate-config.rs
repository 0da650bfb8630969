//! Config validation CLI tool
//!
//! Validates a thermod configuration file and reports any errors.

use std::path::PathBuf;
use std::process::ExitCode;
use thermo_api::ThermalStatus;
use thermo_config::{ConfigError, SensorSpec, CURRENT_CONFIG_VERSION};
use thermo_util::default_config_path;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a thermod configuration file.");
            eprintln!("If no path is provided, uses: {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match thermo_config::load_config(&config_path) {
        Ok(settings) => {
            println!("Configuration is valid");
            println!();
            println!("  Config version: {}", CURRENT_CONFIG_VERSION);
            println!("  Tuning dir:     {}", settings.daemon.tuning_dir.display());
            println!("  Objects:        {}", settings.objects.len());

            for object in &settings.objects {
                let source = match &object.sensor {
                    SensorSpec::Sysfs { path } => format!("sysfs ({})", path.display()),
                };
                println!();
                println!("  - {} [{}]", object.config.name, source);
                for status in ThermalStatus::ALL {
                    let band = object.config.levels[status.index()];
                    println!(
                        "      {:<8} {:>5}..{:<5} poll {}-{}s",
                        status.name(),
                        band.min,
                        band.max,
                        band.mintime,
                        band.maxtime
                    );
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Configuration validation failed");
            eprintln!();
            match &e {
                ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver, CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
