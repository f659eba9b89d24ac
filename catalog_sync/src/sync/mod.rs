//! The sync engine.
//!
//! [`orchestrator::SyncOrchestrator`] drives one run end to end: single-flight
//! start, fetch, per-record transform + upsert, batch-boundary progress and
//! stop checks, and terminal status resolution. [`service::SyncService`] wraps
//! it for callers that only hold a database URL (CLI, API layer).

use serde::Serialize;

use crate::models::sync_run::{SyncRun, SyncStatus};

pub mod control;
pub mod orchestrator;
pub mod service;

pub use orchestrator::SyncOrchestrator;
pub use service::SyncService;

/// Message of a freshly created run.
pub const INITIALIZING: &str = "Initializing...";

/// Tuning knobs for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOptions {
    /// Records between two progress writes / stop checks. Must be >= 1.
    pub batch_size: usize,
    /// How many record errors are quoted in the final message.
    pub max_error_details: usize,
    /// When set, runs left active for longer than this are resolved before a
    /// new run starts.
    pub stale_after: Option<chrono::Duration>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            batch_size: 10,
            max_error_details: 5,
            stale_after: None,
        }
    }
}

/// Result of trying to open a run.
#[derive(Debug, Clone, PartialEq)]
pub enum StartOutcome {
    /// A new run was created in `STARTED`.
    Started(SyncRun),
    /// Another run is active; nothing was created.
    Conflict {
        /// The run holding the single-flight slot.
        active: SyncRun,
        message: String,
    },
}

/// Result of a stop request.
#[derive(Debug, Clone, PartialEq)]
pub enum StopOutcome {
    /// The run moved `STARTED -> STOPPING`.
    Requested(SyncRun),
    /// A stop was already pending.
    AlreadyStopping,
    /// The run had already reached a terminal state.
    AlreadyFinished(SyncStatus),
}

/// Result of [`SyncOrchestrator::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Finished(RunReport),
    Conflict { active: SyncRun, message: String },
}

/// What one run did, as seen by the worker that executed it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: i32,
    /// Persisted status at the end of execution.
    pub status: SyncStatus,
    /// Successful upserts.
    pub count: i32,
    /// Records fetched, when the fetch succeeded.
    pub total: Option<i32>,
    /// Records handed to the transformer before the run stopped.
    pub processed: usize,
    /// Records skipped for lack of a stock id.
    pub skipped: usize,
    /// One entry per failed record.
    pub errors: Vec<String>,
    /// Final persisted message.
    pub message: String,
}

pub(crate) fn conflict_message(active: &SyncRun) -> String {
    format!(
        "A sync is already in progress (run {}, {})",
        active.id, active.status
    )
}
