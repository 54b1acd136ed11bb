use std::path::PathBuf;

use admin::{export, maintenance};
use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use storage::{Database, ScoringStore, dto::scoring::BulkStatusRequest, models::SessionStatus};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "archery-admin")]
#[command(about = "Club archery scoring maintenance tool", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump every member as SQL INSERT statements
    ExportMembers {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Move the sessions of a competition to a new status
    BulkStatus {
        #[arg(long)]
        competition: i32,

        /// Member id of the recorder performing the change
        #[arg(long = "as")]
        recorder: i32,

        #[arg(long, value_parser = parse_status)]
        target: SessionStatus,

        /// Only sessions currently in this status (repeatable)
        #[arg(long = "status", value_parser = parse_status)]
        statuses: Vec<SessionStatus>,

        #[arg(long = "round")]
        round_ids: Vec<i32>,

        #[arg(long)]
        av_number: Option<String>,

        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        dry_run: bool,
    },
    /// Refresh category and cached total of a competition's entries
    RecomputeEntries {
        #[arg(long)]
        competition: i32,
    },
}

fn parse_status(raw: &str) -> Result<SessionStatus, String> {
    raw.parse().map_err(|e: storage::error::StorageError| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "archery_admin={},admin={},storage={}",
                    log_level, log_level, log_level
                )
                .into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    let db = Database::with_max_connections(&cli.database_url, 5)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::ExportMembers { output } => handle_export(&db, output).await?,
        Commands::BulkStatus {
            competition,
            recorder,
            target,
            statuses,
            round_ids,
            av_number,
            date,
            dry_run,
        } => {
            let request = BulkStatusRequest {
                target,
                statuses,
                round_ids,
                av_number,
                session_ids: Vec::new(),
                dry_run,
            };
            let today = date.unwrap_or_else(|| Local::now().date_naive());
            handle_bulk_status(&db, recorder, competition, &request, today).await?;
        }
        Commands::RecomputeEntries { competition } => {
            let refreshed = maintenance::recompute_entries(&db, competition)
                .await
                .with_context(|| format!("Failed to recompute competition {}", competition))?;
            println!("{} entries refreshed", refreshed);
        }
    }

    Ok(())
}

async fn handle_export(db: &dyn ScoringStore, output: Option<PathBuf>) -> anyhow::Result<()> {
    let members = db.list_members().await.context("Failed to load members")?;
    tracing::info!("Exporting {} members", members.len());

    let script = export::members_script(&members);
    match output {
        Some(path) => {
            tokio::fs::write(&path, script)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => print!("{}", script),
    }

    Ok(())
}

async fn handle_bulk_status(
    db: &dyn ScoringStore,
    recorder: i32,
    competition: i32,
    request: &BulkStatusRequest,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let response = maintenance::bulk_status(db, recorder, competition, request, today)
        .await
        .context("Bulk status change failed")?;

    println!(
        "{} sessions matched, {} editable, {} locked",
        response.matched.len(),
        response.editable.len(),
        response.locked.len()
    );

    match response.report {
        None => {
            for row in &response.matched {
                println!(
                    "  #{} {} ({}) {} {} -> {}",
                    row.session_id,
                    row.full_name,
                    row.av_number.as_deref().unwrap_or("-"),
                    row.round_name,
                    row.status,
                    if row.locked { "locked" } else { "editable" }
                );
            }
        }
        Some(report) => {
            println!(
                "updated {}, already at {} {}, blocked reverts {}, failed {}",
                report.updated,
                report.target,
                report.skipped_already_at_target,
                report.skipped_blocked_revert,
                report.failed
            );
            for failure in &report.failures {
                tracing::warn!("Session {}: {}", failure.session_id, failure.error);
            }
        }
    }

    Ok(())
}
