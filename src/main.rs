use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod checkin;
mod clock;
mod config;
mod db;
mod error;
mod models;
mod pace;
mod report;
mod store;
mod week;

use checkin::CheckInOutcome;
use clock::{Clock, FixedClock, SystemClock};
use models::NewCheckIn;

#[derive(Parser)]
#[command(name = "goal-checkins")]
#[command(about = "Weekly family goal check-ins and pace tracking", long_about = None)]
struct Cli {
    #[command(flatten)]
    db: config::DbConfig,

    /// Treat this date (YYYY-MM-DD) as today instead of the local calendar
    #[arg(long, global = true)]
    date: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo goals, metrics and samples
    Seed,
    /// Import metric samples from a CSV file (metric,date,value)
    ImportSamples {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Show this week's session, creating it if needed
    Session {
        #[arg(long)]
        json: bool,
    },
    /// Submit this week's check-in for a family member
    CheckIn {
        #[arg(long)]
        user: Uuid,
        #[arg(long, allow_hyphen_values = true)]
        rating: i32,
        #[arg(long, default_value = "")]
        wins: String,
        #[arg(long, default_value = "")]
        struggles: String,
        #[arg(long, default_value = "")]
        focus: String,
        /// Metric to prioritise next week (repeatable)
        #[arg(long = "priority")]
        priority_metrics: Vec<String>,
        /// Metric that needs attention (repeatable)
        #[arg(long = "flag")]
        flagged_metrics: Vec<String>,
    },
    /// Compare progress against the linear expectation for a dated target
    Pace {
        #[arg(long)]
        current: f64,
        #[arg(long)]
        target: f64,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        target_date: NaiveDate,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report for this week
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

/// `RUST_LOG`-style directives, falling back to `warn` when none are given.
fn log_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(directives)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&directives))
        .with_target(false)
        .init();

    let clock: Box<dyn Clock> = match cli.date {
        Some(date) => Box::new(FixedClock(date)),
        None => Box::new(SystemClock),
    };

    match cli.command {
        Commands::InitDb => {
            let pool = cli.db.connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = cli.db.connect().await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::ImportSamples { csv } => {
            let pool = cli.db.connect().await?;
            let imported = db::import_samples(&pool, &csv).await?;
            println!("Imported {imported} samples from {}.", csv.display());
        }
        Commands::Session { json } => {
            let store = db::PgStore::new(cli.db.connect().await?);
            let session = week::resolve_current_session(&store, clock.as_ref()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&session)?);
            } else {
                println!("Week starting {} (session {})", session.week_start_date, session.id);
                if week::is_check_in_day(clock.today()) {
                    println!("Today is check-in day.");
                }
            }
        }
        Commands::CheckIn {
            user,
            rating,
            wins,
            struggles,
            focus,
            priority_metrics,
            flagged_metrics,
        } => {
            let store = db::PgStore::new(cli.db.connect().await?);
            let draft = NewCheckIn {
                overall_rating: rating,
                wins,
                struggles,
                next_week_focus: focus,
                priority_metrics,
                flagged_metrics,
            };
            match checkin::submit_check_in(&store, &store, clock.as_ref(), user, draft).await? {
                CheckInOutcome::Created(check_in) => {
                    println!("Check-in {} recorded.", check_in.id);
                }
                CheckInOutcome::AlreadySubmitted(session) => {
                    println!(
                        "Already checked in for the week starting {}.",
                        session.week_start_date
                    );
                }
            }
        }
        // Pure arithmetic, no database needed.
        Commands::Pace {
            current,
            target,
            start,
            target_date,
            json,
        } => {
            let result = pace::estimate_pace(current, target, start, target_date, clock.today())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{:.1}% complete, {}", result.percentage, result.status.label());
            }
        }
        Commands::Report { out } => {
            let store = db::PgStore::new(cli.db.connect().await?);
            let report = report::weekly_report(&store, clock.as_ref()).await?;
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
