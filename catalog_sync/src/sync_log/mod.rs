//! Sync run log: the audit table behind the run state machine.
//!
//! Operators read it to follow progress; the orchestrator polls it at batch
//! boundaries to notice stop requests.
use diesel::SqliteConnection;

use crate::errors::RepoResult;
use crate::models::sync_run::{SyncRun, SyncRunUpdate};

pub mod repo;

pub use repo::SqliteSyncLog;

/// Portable surface, SQLite implementation lives in `repo.rs`.
pub trait SyncLogStore {
    /// Appends a new run in `STARTED` with the given message.
    ///
    /// Does not check for other active runs; callers wrap this in an
    /// immediate transaction together with [`SyncLogStore::active`].
    fn create(&self, conn: &mut SqliteConnection, message: &str) -> RepoResult<SyncRun>;

    /// Reads one run.
    fn get(&self, conn: &mut SqliteConnection, id: i32) -> RepoResult<Option<SyncRun>>;

    /// Applies a partial update.
    ///
    /// A requested status change must be allowed by the state machine, and
    /// progress-only updates apply to active runs only. Anything else,
    /// including any write to a terminal run, is a no-op and returns `None`.
    /// `count` never decreases. Fails with
    /// [`crate::errors::RepoError::RunNotFound`] for an unknown id.
    fn update(
        &self,
        conn: &mut SqliteConnection,
        id: i32,
        update: &SyncRunUpdate,
    ) -> RepoResult<Option<SyncRun>>;

    /// Most recently created run.
    fn latest(&self, conn: &mut SqliteConnection) -> RepoResult<Option<SyncRun>>;

    /// The run currently `STARTED` or `STOPPING`, if any.
    fn active(&self, conn: &mut SqliteConnection) -> RepoResult<Option<SyncRun>>;

    /// Up to `limit` runs, newest first.
    fn list_recent(&self, conn: &mut SqliteConnection, limit: i64) -> RepoResult<Vec<SyncRun>>;

    /// Active runs whose last write is older than `cutoff` (RFC-3339 UTC).
    fn list_active_before(
        &self,
        conn: &mut SqliteConnection,
        cutoff: &str,
    ) -> RepoResult<Vec<SyncRun>>;
}

impl<T: SyncLogStore + ?Sized> SyncLogStore for &T {
    fn create(&self, conn: &mut SqliteConnection, message: &str) -> RepoResult<SyncRun> {
        (**self).create(conn, message)
    }

    fn get(&self, conn: &mut SqliteConnection, id: i32) -> RepoResult<Option<SyncRun>> {
        (**self).get(conn, id)
    }

    fn update(
        &self,
        conn: &mut SqliteConnection,
        id: i32,
        update: &SyncRunUpdate,
    ) -> RepoResult<Option<SyncRun>> {
        (**self).update(conn, id, update)
    }

    fn latest(&self, conn: &mut SqliteConnection) -> RepoResult<Option<SyncRun>> {
        (**self).latest(conn)
    }

    fn active(&self, conn: &mut SqliteConnection) -> RepoResult<Option<SyncRun>> {
        (**self).active(conn)
    }

    fn list_recent(&self, conn: &mut SqliteConnection, limit: i64) -> RepoResult<Vec<SyncRun>> {
        (**self).list_recent(conn, limit)
    }

    fn list_active_before(
        &self,
        conn: &mut SqliteConnection,
        cutoff: &str,
    ) -> RepoResult<Vec<SyncRun>> {
        (**self).list_active_before(conn, cutoff)
    }
}
