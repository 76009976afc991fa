//! `bookctl` CLI — validate interviewer schedules and simulate booking traffic.
//!
//! ## Usage
//!
//! ```sh
//! # Validate a weekly schedule grid (stdin → summary)
//! cat schedule.json | bookctl validate --timezone America/New_York
//!
//! # Validate from a file
//! bookctl validate -i schedule.json -t America/New_York
//!
//! # List the 30-minute sub-slots a schedule offers on one date
//! bookctl slots -i schedule.json -t America/New_York -d 2026-03-16 --duration 30
//!
//! # Replay a scenario of booking requests against a fresh engine
//! bookctl simulate -i scenario.json
//!
//! # Same, with engine debug logs on stderr
//! bookctl simulate -i scenario.json --verbose
//! ```

use std::io::{self, Read};
use std::sync::Arc;

use anyhow::{Context, Result};
use booking_engine::{
    availability, schedule, BookingEngine, BookingRequest, MemoryStore, SessionKind, WeeklySchedule,
};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(
    name = "bookctl",
    version,
    about = "Interview availability and booking engine CLI"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable engine debug logs on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a weekly schedule grid and print the slots it compiles to
    Validate {
        /// Input schedule JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// IANA timezone the schedule is anchored in
        #[arg(short, long)]
        timezone: String,
        /// Interviewer id to stamp into the compiled slot ids
        #[arg(long, default_value = "interviewer")]
        interviewer: String,
    },
    /// List the fixed-duration sub-slots a schedule offers on one date
    Slots {
        /// Input schedule JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// IANA timezone the schedule is anchored in
        #[arg(short, long)]
        timezone: String,
        /// Date to expand, as YYYY-MM-DD
        #[arg(short, long)]
        date: String,
        /// Sub-slot length in minutes
        #[arg(long, default_value_t = 60)]
        duration: u32,
    },
    /// Replay a scenario of booking requests and report each outcome
    Simulate {
        /// Input scenario JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
}

/// Scenario file for `simulate`: one interviewer's schedule plus a sequence
/// of live booking requests to replay in order. Unknown keys are rejected,
/// matching the schedule grid itself.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Scenario {
    interviewer: String,
    timezone: String,
    schedule: WeeklySchedule,
    /// One-off availability windows on single dates, applied after the
    /// weekly schedule.
    #[serde(default)]
    date_slots: Vec<ScenarioDateSlot>,
    requests: Vec<ScenarioRequest>,
}

#[derive(Deserialize)]
struct ScenarioDateSlot {
    date: NaiveDate,
    start: String,
    end: String,
}

#[derive(Deserialize)]
struct ScenarioRequest {
    candidate: String,
    start: DateTime<Utc>,
    duration_minutes: u32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("booking_engine=debug")),
            )
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }

    match cli.command {
        Commands::Validate {
            input,
            timezone,
            interviewer,
        } => {
            let json = read_input(input.as_deref())?;
            let grid: WeeklySchedule =
                serde_json::from_str(&json).context("Failed to parse schedule JSON")?;
            let slots = schedule::compile(&interviewer, &grid, &timezone)
                .context("Schedule is not valid")?;
            println!(
                "schedule OK: {} slots across {} days",
                slots.len(),
                grid.enabled_days()
            );
            for slot in &slots {
                println!("  {}", slot.id);
            }
        }
        Commands::Slots {
            input,
            timezone,
            date,
            duration,
        } => {
            let json = read_input(input.as_deref())?;
            let grid: WeeklySchedule =
                serde_json::from_str(&json).context("Failed to parse schedule JSON")?;
            let date: NaiveDate = date
                .parse()
                .with_context(|| format!("Invalid date: {date}, expected YYYY-MM-DD"))?;
            let slots =
                schedule::compile("interviewer", &grid, &timezone).context("Schedule is not valid")?;
            for slot in availability::sub_slots_for_date(&slots, date, duration) {
                println!("{}-{}", slot.start, slot.end);
            }
        }
        Commands::Simulate { input } => {
            let json = read_input(input.as_deref())?;
            let scenario: Scenario =
                serde_json::from_str(&json).context("Failed to parse scenario JSON")?;
            run_scenario(scenario)?;
        }
    }

    Ok(())
}

/// Replay a scenario against a fresh in-memory engine, printing one line per
/// request and a final tally.
fn run_scenario(scenario: Scenario) -> Result<()> {
    let engine = BookingEngine::new(Arc::new(MemoryStore::default()));
    engine
        .set_weekly_schedule(&scenario.interviewer, &scenario.schedule, &scenario.timezone)
        .context("Scenario schedule is not valid")?;
    for slot in &scenario.date_slots {
        engine
            .upsert_date_slot(
                &scenario.interviewer,
                slot.date,
                &slot.start,
                &slot.end,
                &scenario.timezone,
            )
            .with_context(|| format!("Invalid date slot on {}", slot.date))?;
    }

    let total = scenario.requests.len();
    let mut booked = 0usize;
    for request in scenario.requests {
        let start = request.start.format("%Y-%m-%dT%H:%M:%SZ");
        let outcome = engine.request_booking(BookingRequest {
            candidate_id: request.candidate.clone(),
            interviewer_id: Some(scenario.interviewer.clone()),
            scheduled_at: request.start,
            duration_minutes: request.duration_minutes,
            session: SessionKind::Live,
        });
        match outcome {
            Ok(booking) => {
                booked += 1;
                println!(
                    "booked    {}  {}  {}m  {}",
                    request.candidate, start, request.duration_minutes, booking.id
                );
            }
            Err(err) => {
                println!(
                    "rejected  {}  {}  {}m  ({err})",
                    request.candidate, start, request.duration_minutes
                );
            }
        }
    }
    println!("{booked} of {total} requests booked");
    Ok(())
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}
