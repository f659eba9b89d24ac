//! Sync run rows and the run status state machine.
//!
//! ```text
//! (none) ──create──▶ STARTED
//! STARTED ──stop requested──▶ STOPPING
//! STOPPING ──batch boundary──▶ CANCELLED
//! STARTED ──done, no item errors──▶ COMPLETED
//! STARTED ──done, item errors──▶ COMPLETED_WITH_ERRORS
//! STARTED ──fatal fetch error──▶ FAILED
//! ```
//!
//! Terminal states never transition again. `UNKNOWN` is what an unrecognized
//! database value reads as; nothing transitions into or out of it.

use std::{fmt, str::FromStr};

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::sync_run;

/// Lifecycle state of a [`SyncRun`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    Started,
    Stopping,
    Cancelled,
    Completed,
    CompletedWithErrors,
    Failed,
    Unknown,
}

impl SyncStatus {
    /// Database / wire spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            SyncStatus::Started => "STARTED",
            SyncStatus::Stopping => "STOPPING",
            SyncStatus::Cancelled => "CANCELLED",
            SyncStatus::Completed => "COMPLETED",
            SyncStatus::CompletedWithErrors => "COMPLETED_WITH_ERRORS",
            SyncStatus::Failed => "FAILED",
            SyncStatus::Unknown => "UNKNOWN",
        }
    }

    /// Reads a database value; anything unrecognized becomes [`SyncStatus::Unknown`].
    pub fn from_db(s: &str) -> Self {
        s.parse().unwrap_or(SyncStatus::Unknown)
    }

    /// `STARTED` or `STOPPING`.
    pub const fn is_active(self) -> bool {
        matches!(self, SyncStatus::Started | SyncStatus::Stopping)
    }

    /// `CANCELLED`, `COMPLETED`, `COMPLETED_WITH_ERRORS` or `FAILED`.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            SyncStatus::Cancelled
                | SyncStatus::Completed
                | SyncStatus::CompletedWithErrors
                | SyncStatus::Failed
        )
    }

    /// Whether the state machine allows `self -> next`.
    pub const fn can_transition_to(self, next: SyncStatus) -> bool {
        use SyncStatus::*;
        matches!(
            (self, next),
            (Started, Stopping)
                | (Started, Completed)
                | (Started, CompletedWithErrors)
                | (Started, Failed)
                | (Stopping, Cancelled)
        )
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "STARTED" => SyncStatus::Started,
            "STOPPING" => SyncStatus::Stopping,
            "CANCELLED" => SyncStatus::Cancelled,
            "COMPLETED" => SyncStatus::Completed,
            "COMPLETED_WITH_ERRORS" => SyncStatus::CompletedWithErrors,
            "FAILED" => SyncStatus::Failed,
            "UNKNOWN" => SyncStatus::Unknown,
            _ => anyhow::bail!("unknown sync status: {s}"),
        })
    }
}

/// A row in [`crate::schema::sync_run`] exactly as stored.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = sync_run, check_for_backend(diesel::sqlite::Sqlite))]
pub struct SyncRunRow {
    pub id: i32,
    pub status: String,
    pub message: String,
    pub count: i32,
    pub total: Option<i32>,
    pub error_count: i32,
    pub created_at: String,
    pub updated_at: String,
}

/// One sync invocation, as seen by operators and the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncRun {
    /// Opaque identifier assigned at creation.
    pub id: i32,
    pub status: SyncStatus,
    /// Human-readable progress or result text.
    pub message: String,
    /// Records successfully upserted so far. Never decreases within a run.
    pub count: i32,
    /// Records fetched from the supplier, once known.
    pub total: Option<i32>,
    /// Record-level failures so far.
    pub error_count: i32,
    /// RFC3339 UTC, immutable.
    pub created_at: String,
    /// RFC3339 UTC of the last write.
    pub updated_at: String,
}

impl From<SyncRunRow> for SyncRun {
    fn from(row: SyncRunRow) -> Self {
        Self {
            id: row.id,
            status: SyncStatus::from_db(&row.status),
            message: row.message,
            count: row.count,
            total: row.total,
            error_count: row.error_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Insertable form of [`SyncRunRow`].
#[derive(Debug, Insertable)]
#[diesel(table_name = sync_run)]
pub struct NewSyncRun<'a> {
    pub status: &'a str,
    pub message: &'a str,
    pub count: i32,
    pub error_count: i32,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Changeset applied by the store; `None` leaves a column untouched.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = sync_run)]
pub(crate) struct SyncRunChanges<'a> {
    pub(crate) status: Option<&'a str>,
    pub(crate) message: Option<&'a str>,
    pub(crate) count: Option<i32>,
    pub(crate) total: Option<i32>,
    pub(crate) error_count: Option<i32>,
    pub(crate) updated_at: &'a str,
}

/// Partial update of a run. Build with the chained setters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncRunUpdate {
    pub status: Option<SyncStatus>,
    pub message: Option<String>,
    pub count: Option<i32>,
    pub total: Option<i32>,
    pub error_count: Option<i32>,
}

impl SyncRunUpdate {
    /// Status transition request.
    pub fn status(mut self, status: SyncStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn count(mut self, count: i32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn total(mut self, total: i32) -> Self {
        self.total = Some(total);
        self
    }

    pub fn error_count(mut self, error_count: i32) -> Self {
        self.error_count = Some(error_count);
        self
    }
}
