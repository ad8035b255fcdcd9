//! parkbot - books a parking window as a series of short paid sessions
//!
//! This is the main entry point. It wires together:
//! - Configuration loading
//! - The command-driven booking collaborator
//! - The core engine
//! - Ctrl-C handling
//! - Report output

mod report;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::Parser;
use parkbot_api::{AccountStatus, TargetDay};
use parkbot_booking_api::{BookingCollaborator, BookingError, BookingResult};
use parkbot_booking_cmd::CommandBooker;
use parkbot_config::{load_config, load_or_default, Settings};
use parkbot_core::{Engine, RunRequest};
use parkbot_util::{config_path_without_env, TimeRange};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Some sessions failed or were skipped
const EXIT_PARTIAL: u8 = 2;

/// parkbot - Book a parking window as a series of short paid sessions
#[derive(Parser, Debug)]
#[command(name = "parkbot", version)]
#[command(about = "Book a parking window as a series of short paid sessions", long_about = None)]
struct Args {
    /// Window to park in, e.g. 13:00-14:00
    #[arg(value_name = "HH:MM-HH:MM")]
    range: TimeRange,

    /// Session length in minutes (overrides config)
    #[arg(short, long, value_name = "MINUTES")]
    session: Option<u32>,

    /// Longest free break between sessions in minutes (overrides config)
    #[arg(short = 'b', long, value_name = "MINUTES")]
    max_break: Option<u32>,

    /// Book for tomorrow instead of today
    #[arg(short, long, conflicts_with = "day")]
    tomorrow: bool,

    /// Day to book for: today or tomorrow
    #[arg(short, long, value_name = "DAY")]
    day: Option<TargetDay>,

    /// Configuration file path (default: ~/.config/parkbot/config.toml)
    #[arg(short, long, env = "PARKBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Plan and check the account without booking anything
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Debug logging (same as --log-level debug)
    #[arg(short, long)]
    verbose: bool,

    /// Log level
    #[arg(short, long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn target_day(&self) -> TargetDay {
        match (self.tomorrow, self.day) {
            (true, _) => TargetDay::Tomorrow,
            (false, Some(day)) => day,
            (false, None) => TargetDay::Today,
        }
    }

    fn request(&self) -> RunRequest {
        RunRequest {
            range: self.range,
            day: self.target_day(),
            session_minutes: self.session,
            max_break_minutes: self.max_break,
            dry_run: self.dry_run,
        }
    }
}

/// Stand-in when no `[booking]` section is configured; only dry runs get here
struct OfflineBooker;

#[async_trait]
impl BookingCollaborator for OfflineBooker {
    async fn book_session(&self, _window: &TimeRange, _day: TargetDay) -> BookingResult<()> {
        Err(BookingError::non_retryable("no booking helper configured"))
    }

    async fn account_status(&self) -> BookingResult<AccountStatus> {
        Err(BookingError::non_retryable("no status helper configured"))
    }
}

fn load_settings(args: &Args) -> Result<Settings> {
    match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path)),
        None => {
            let path = config_path_without_env();
            load_or_default(&path)
                .with_context(|| format!("Failed to load config from {:?}", path))
        }
    }
}

fn build_booker(settings: &Settings, dry_run: bool) -> Result<Box<dyn BookingCollaborator>> {
    match &settings.booking {
        Some(booking) => Ok(Box::new(CommandBooker::with_options(
            booking.book_command.clone(),
            booking.status_command.clone(),
            booking.env.clone(),
            booking.timeout,
            settings.budget.monthly_allowance,
        ))),
        None if dry_run => {
            debug!("No [booking] section, account checks unavailable");
            Ok(Box::new(OfflineBooker))
        }
        None => bail!("No [booking] section configured; add one or use --dry-run"),
    }
}

/// Cancellation channel fed by Ctrl-C
fn spawn_interrupt_handler() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current session");
            let _ = tx.send(true);
        }
    });
    rx
}

fn init_logging(args: &Args) {
    let level = match (&args.log_level, args.verbose) {
        (Some(level), _) => level.as_str(),
        (None, true) => "debug",
        (None, false) => "info",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if args.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let settings = load_settings(&args)?;
    let booker = build_booker(&settings, args.dry_run)?;
    let request = args.request();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        range = %request.range,
        day = %request.day,
        dry_run = request.dry_run,
        "parkbot starting"
    );
    if parkbot_util::is_mock_time_active() {
        warn!(now = %parkbot_util::now(), "Mock time active, dates are simulated");
    }

    let engine = Engine::new(settings);
    let cancel = spawn_interrupt_handler();
    let summary = engine
        .execute(&request, booker.as_ref(), Some(cancel))
        .await
        .context("Could not plan sessions")?;

    if args.json {
        println!("{}", report::render_json(&summary)?);
    } else {
        print!("{}", report::render_text(&summary));
    }

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_PARTIAL)
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("parkbot").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let args = parse(&["13:00-14:00"]);
        let request = args.request();
        assert_eq!(request.range.to_string(), "13:00-14:00");
        assert_eq!(request.day, TargetDay::Today);
        assert_eq!(request.session_minutes, None);
        assert!(!request.dry_run);
    }

    #[test]
    fn overrides_and_day() {
        let args = parse(&["9:30-11:00", "--session", "15", "-b", "0", "--tomorrow", "-n"]);
        let request = args.request();
        assert_eq!(request.range.to_string(), "09:30-11:00");
        assert_eq!(request.day, TargetDay::Tomorrow);
        assert_eq!(request.session_minutes, Some(15));
        assert_eq!(request.max_break_minutes, Some(0));
        assert!(request.dry_run);

        assert_eq!(parse(&["13:00-14:00", "--day", "tomorrow"]).target_day(), TargetDay::Tomorrow);
    }

    #[test]
    fn rejects_bad_input() {
        let bad = |argv: &[&str]| {
            Args::try_parse_from(std::iter::once("parkbot").chain(argv.iter().copied())).is_err()
        };
        assert!(bad(&["14:00-13:00"]));
        assert!(bad(&["13:00"]));
        assert!(bad(&["13:00-14:00", "--day", "yesterday"]));
        assert!(bad(&["13:00-14:00", "--tomorrow", "--day", "today"]));
    }

    #[test]
    fn booking_required_unless_dry_run() {
        let settings = Settings::default();
        assert!(build_booker(&settings, false).is_err());
        assert!(build_booker(&settings, true).is_ok());
    }
}
