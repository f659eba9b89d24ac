//! Connection-owning facade over [`SyncOrchestrator`].
//!
//! This is the surface the excluded UI/API layer talks to: start a sync in the
//! background, ask it to stop, and read status for polling dashboards. Each
//! call opens its own SQLite connection; the background run keeps one for its
//! whole lifetime.

use std::sync::Arc;

use anyhow::Context;
use diesel::SqliteConnection;
use supplier_client::providers::InventorySource;
use tokio::task::JoinHandle;

use crate::{
    catalog::repo::{CatalogRepo, CatalogStats},
    db::connection::connect_sqlite,
    models::sync_run::SyncRun,
    sync::{RunReport, StartOutcome, StopOutcome, SyncOptions, SyncOrchestrator},
    sync_log::SyncLogStore,
};

type SharedOrchestrator = Arc<SyncOrchestrator<Arc<dyn InventorySource>>>;

/// Answer to [`SyncService::start_sync`].
#[derive(Debug)]
pub enum StartResponse {
    /// A run was opened and is executing on the Tokio runtime.
    Started {
        run_id: i32,
        /// Resolves once the run reaches a terminal state. Dropping it does
        /// not stop the run; use [`SyncService::request_stop`].
        task: JoinHandle<anyhow::Result<RunReport>>,
    },
    /// Another run is active. Equivalent of an HTTP 409.
    Conflict { active_run_id: i32, message: String },
}

impl StartResponse {
    pub fn started(&self) -> bool {
        matches!(self, StartResponse::Started { .. })
    }

    pub fn run_id(&self) -> i32 {
        match self {
            StartResponse::Started { run_id, .. } => *run_id,
            StartResponse::Conflict { active_run_id, .. } => *active_run_id,
        }
    }

    pub fn conflict_message(&self) -> Option<&str> {
        match self {
            StartResponse::Started { .. } => None,
            StartResponse::Conflict { message, .. } => Some(message),
        }
    }

    /// The background task, if a run was started.
    pub fn into_task(self) -> Option<JoinHandle<anyhow::Result<RunReport>>> {
        match self {
            StartResponse::Started { task, .. } => Some(task),
            StartResponse::Conflict { .. } => None,
        }
    }
}

/// Sync operations bound to one database and one inventory source.
#[derive(Clone)]
pub struct SyncService {
    database_url: String,
    orchestrator: SharedOrchestrator,
}

impl SyncService {
    pub fn new(
        database_url: impl Into<String>,
        source: Arc<dyn InventorySource>,
        options: SyncOptions,
    ) -> Self {
        Self {
            database_url: database_url.into(),
            orchestrator: Arc::new(SyncOrchestrator::new(source, options)),
        }
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    fn connect(&self) -> anyhow::Result<SqliteConnection> {
        connect_sqlite(&self.database_url)
            .with_context(|| format!("opening database {}", self.database_url))
    }

    /// Opens a run and executes it in the background.
    ///
    /// Only reports whether the run was started; its outcome is observed
    /// through the run log (or by awaiting the returned task). Must be called
    /// from within a Tokio runtime. The fetch runs on the runtime, the record
    /// loop on its blocking pool, so status reads and stop requests from other
    /// tasks are served while records are written.
    pub fn start_sync(&self) -> anyhow::Result<StartResponse> {
        let runtime = tokio::runtime::Handle::try_current()
            .context("start_sync must be called from within a Tokio runtime")?;
        let mut conn = self.connect()?;

        match self.orchestrator.begin(&mut conn)? {
            StartOutcome::Started(run) => {
                let run_id = run.id;
                let orchestrator = Arc::clone(&self.orchestrator);
                let task = runtime.spawn(execute_in_background(orchestrator, conn, run_id));
                Ok(StartResponse::Started { run_id, task })
            }
            StartOutcome::Conflict { active, message } => Ok(StartResponse::Conflict {
                active_run_id: active.id,
                message,
            }),
        }
    }

    /// Fire-and-forget stop request.
    pub fn request_stop(&self, run_id: i32) -> anyhow::Result<StopOutcome> {
        let mut conn = self.connect()?;
        self.orchestrator.request_stop(&mut conn, run_id)
    }

    pub fn get_run(&self, run_id: i32) -> anyhow::Result<Option<SyncRun>> {
        let mut conn = self.connect()?;
        self.orchestrator.log().get(&mut conn, run_id)
    }

    pub fn latest_run(&self) -> anyhow::Result<Option<SyncRun>> {
        let mut conn = self.connect()?;
        self.orchestrator.log().latest(&mut conn)
    }

    /// Newest first.
    pub fn recent_runs(&self, n: i64) -> anyhow::Result<Vec<SyncRun>> {
        let mut conn = self.connect()?;
        self.orchestrator.log().list_recent(&mut conn, n)
    }

    pub fn catalog_stats(&self) -> anyhow::Result<CatalogStats> {
        let mut conn = self.connect()?;
        self.orchestrator.catalog().stats(&mut conn)
    }

    pub fn reap_stale(&self, older_than: chrono::Duration) -> anyhow::Result<Vec<SyncRun>> {
        let mut conn = self.connect()?;
        self.orchestrator.reap_stale_runs(&mut conn, older_than)
    }
}

async fn execute_in_background(
    orchestrator: SharedOrchestrator,
    mut conn: SqliteConnection,
    run_id: i32,
) -> anyhow::Result<RunReport> {
    if let Some(report) = orchestrator.prepare(&mut conn, run_id)? {
        return Ok(report);
    }
    let fetched = orchestrator.fetch(run_id).await;
    tokio::task::spawn_blocking(move || orchestrator.ingest(&mut conn, run_id, fetched))
        .await
        .context("sync worker panicked")?
}
