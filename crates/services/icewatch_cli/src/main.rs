// File: services/icewatch_cli/src/main.rs
use chrono::Utc;
use clap::{Parser, Subcommand};
use icewatch_common::{day_key, logging, ExitCode as _, IcewatchError, LocalZone};
use icewatch_config::load_config;
use icewatch_db::DbClient;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::{info, Level};

mod service_factory;
mod views;

use service_factory::build_tracker;
use views::{write_dump, write_summary, SummaryRange};

#[derive(Parser)]
#[command(name = "icewatch", version, about = "Tracks ice rink sessions and mirrors them into calendars")]
struct Cli {
    /// Default log level; RUST_LOG directives take precedence
    #[arg(long, default_value = "info")]
    log_level: Level,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Find which products have events on which days (run daily)
    CheckCalendar,
    /// Refresh sessions of today and every later known day
    CheckEvents,
    /// Refresh today's sessions only
    CheckTodaysEvents,
    /// Refresh today's sessions if one starts within five minutes (run often)
    CheckIfEventsStartingSoon,
    /// Latest state of every session from today on
    Summary,
    /// Latest state of today's and tomorrow's sessions
    BriefSummary,
    /// Latest state of every stored session
    FullSummary,
    /// Print the raw contents of the store
    DumpDb,
}

async fn run(command: Command) -> Result<(), IcewatchError> {
    let config = load_config()?;
    let db = DbClient::new(&config).await?;
    let now = Utc::now();
    let today = day_key(LocalZone::resolve(&config.timezone).today(now));

    let summary_range = match command {
        Command::Summary => Some(SummaryRange::FromToday),
        Command::BriefSummary => Some(SummaryRange::TodayAndTomorrow),
        Command::FullSummary => Some(SummaryRange::Everything),
        _ => None,
    };
    if let Some(range) = summary_range {
        let mut out = io::stdout().lock();
        write_summary(&db, range, &today, &mut out).await?;
        out.flush()?;
        return Ok(());
    }
    if let Command::DumpDb = command {
        let mut out = io::stdout().lock();
        write_dump(&db, &mut out).await?;
        out.flush()?;
        return Ok(());
    }

    let tracker = build_tracker(&config, db)?;
    let report = match command {
        Command::CheckCalendar => Some(tracker.check_for_new_days(now).await?),
        Command::CheckEvents => Some(tracker.check_for_events(false, now).await?),
        Command::CheckTodaysEvents => Some(tracker.check_for_events(true, now).await?),
        Command::CheckIfEventsStartingSoon => tracker.check_if_events_starting_soon(now).await?,
        _ => None,
    };
    if let Some(report) = report {
        info!("{:?} done: {}", command, report);
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_with_level(cli.log_level);

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logging::log_error(&e, &format!("{:?} failed", cli.command));
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}
