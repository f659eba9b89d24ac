use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use catalog_sync::{
    catalog::repo::{CatalogRepo, SqliteCatalogRepo},
    config::AppConfig,
    db::{connection::connect_sqlite, migrate},
    sync::{StartOutcome, StopOutcome, SyncOrchestrator, control},
    sync_log::{SqliteSyncLog, SyncLogStore},
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use supplier_client::providers::supplier_rest::provider::SupplierRestProvider;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Exit status when another run already holds the single-flight slot.
const EXIT_CONFLICT: u8 = 2;

#[derive(Parser)]
#[command(version, about = "Diamond catalog sync CLI")]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(long, short, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Apply pending database migrations.
    Migrate,
    /// Run one sync in the foreground. Ctrl-C requests a stop.
    Run,
    /// Ask a running sync to stop at its next batch boundary.
    Stop {
        #[arg(long)]
        run_id: i32,
    },
    /// Show the latest run.
    Status,
    /// Show recent runs, newest first.
    History {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// Show catalog totals.
    Stats,
    /// Resolve runs left active by a crashed worker.
    Reap {
        #[arg(long, default_value_t = 120)]
        older_than_mins: i64,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = AppConfig::load(cli.config.as_deref())?;

    match cli.cmd {
        Cmd::Migrate => migrate::run_sqlite(&cfg.database_url)?,
        Cmd::Run => return run(&cfg).await,
        Cmd::Stop { run_id } => {
            let outcome = stop_run(&cfg.database_url, run_id)?;
            println!("{outcome:?}");
        }
        Cmd::Status => {
            let mut conn = connect_sqlite(&cfg.database_url)?;
            print_json(&SqliteSyncLog::new().latest(&mut conn)?)?;
        }
        Cmd::History { limit } => {
            let mut conn = connect_sqlite(&cfg.database_url)?;
            print_json(&SqliteSyncLog::new().list_recent(&mut conn, limit)?)?;
        }
        Cmd::Stats => {
            let mut conn = connect_sqlite(&cfg.database_url)?;
            print_json(&SqliteCatalogRepo::new().stats(&mut conn)?)?;
        }
        Cmd::Reap { older_than_mins } => {
            let mut conn = connect_sqlite(&cfg.database_url)?;
            let reaped = control::reap_stale_runs(
                &SqliteSyncLog::new(),
                &mut conn,
                chrono::Duration::minutes(older_than_mins),
            )?;
            print_json(&reaped)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn run(cfg: &AppConfig) -> Result<ExitCode> {
    migrate::run_sqlite(&cfg.database_url)?;
    let provider = SupplierRestProvider::from_env(&cfg.supplier)?;
    let orchestrator = SyncOrchestrator::new(provider, cfg.sync.to_options());
    let mut conn = connect_sqlite(&cfg.database_url)?;

    let run = match orchestrator.begin(&mut conn)? {
        StartOutcome::Started(run) => run,
        StartOutcome::Conflict { message, .. } => {
            eprintln!("{message}");
            return Ok(ExitCode::from(EXIT_CONFLICT));
        }
    };

    let stopper = stop_on_ctrl_c(cfg.database_url.clone(), run.id);
    let report = orchestrator.execute(&mut conn, run.id).await;
    stopper.abort();

    print_json(&report?)?;
    Ok(ExitCode::SUCCESS)
}

/// Turns the first Ctrl-C into a stop request for `run_id`.
fn stop_on_ctrl_c(database_url: String, run_id: i32) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::warn!(run_id, "interrupt received, stopping at next batch boundary");
        if let Err(e) = stop_run(&database_url, run_id) {
            tracing::error!(run_id, error = %format!("{e:#}"), "could not request stop");
        }
    })
}

fn stop_run(database_url: &str, run_id: i32) -> Result<StopOutcome> {
    let mut conn = connect_sqlite(database_url)?;
    control::request_stop(&SqliteSyncLog::new(), &mut conn, run_id)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
