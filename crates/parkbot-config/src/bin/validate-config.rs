//! Config validation CLI tool
//!
//! Validates a parkbot configuration file and prints the effective settings.

use parkbot_config::{ConfigError, CURRENT_CONFIG_VERSION};
use parkbot_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) if path == "-h" || path == "--help" => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a parkbot configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            return ExitCode::from(2);
        }
        Some(path) => PathBuf::from(path),
        None => default_config_path(),
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match parkbot_config::load_config(&config_path) {
        Ok(settings) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", CURRENT_CONFIG_VERSION);
            println!(
                "  Sessions: {} min, breaks up to {} min",
                settings.planner.session_minutes, settings.planner.max_break_minutes
            );
            println!(
                "  Monthly allowance: {}",
                parkbot_util::format_hours(settings.budget.monthly_allowance)
            );
            println!(
                "  Retry: {} attempts, {:?} backoff",
                settings.retry.max_attempts, settings.retry.backoff
            );
            match &settings.booking {
                Some(booking) => {
                    println!("  Book command: {}", booking.book_command.join(" "));
                    println!("  Status command: {}", booking.status_command.join(" "));
                }
                None => println!("  Booking helpers: not configured (dry runs only)"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
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
