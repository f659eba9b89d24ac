use diesel::prelude::*;

use crate::{
    errors::{RepoError, RepoResult},
    models::sync_run::{NewSyncRun, SyncRun, SyncRunChanges, SyncRunRow, SyncRunUpdate, SyncStatus},
    schema::sync_run,
    sync_log::SyncLogStore,
    tz,
};

use crate::schema::sync_run::dsl as sr;

const ACTIVE: [&str; 2] = [SyncStatus::Started.as_str(), SyncStatus::Stopping.as_str()];

/// SQLite-backed [`SyncLogStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteSyncLog;

impl SqliteSyncLog {
    pub fn new() -> Self {
        Self
    }
}

impl SyncLogStore for SqliteSyncLog {
    fn create(&self, conn: &mut SqliteConnection, message: &str) -> RepoResult<SyncRun> {
        let now = tz::now_rfc3339();
        let row = diesel::insert_into(sync_run::table)
            .values(NewSyncRun {
                status: SyncStatus::Started.as_str(),
                message,
                count: 0,
                error_count: 0,
                created_at: &now,
                updated_at: &now,
            })
            .returning(SyncRunRow::as_returning())
            .get_result(conn)?;
        Ok(row.into())
    }

    fn get(&self, conn: &mut SqliteConnection, id: i32) -> RepoResult<Option<SyncRun>> {
        let row = sr::sync_run
            .find(id)
            .select(SyncRunRow::as_select())
            .first(conn)
            .optional()?;
        Ok(row.map(SyncRun::from))
    }

    fn update(
        &self,
        conn: &mut SqliteConnection,
        id: i32,
        update: &SyncRunUpdate,
    ) -> RepoResult<Option<SyncRun>> {
        let current = self.get(conn, id)?.ok_or(RepoError::RunNotFound(id))?;

        let allowed = match update.status {
            Some(next) => current.status.can_transition_to(next),
            None => current.status.is_active(),
        };
        if !allowed {
            tracing::debug!(
                run_id = id,
                status = %current.status,
                requested = ?update.status,
                "sync run update ignored"
            );
            return Ok(None);
        }

        let now = tz::now_rfc3339();
        let changes = SyncRunChanges {
            status: update.status.map(SyncStatus::as_str),
            message: update.message.as_deref(),
            count: update.count.map(|c| c.max(current.count)),
            total: update.total,
            error_count: update.error_count,
            updated_at: &now,
        };

        // Compare-and-set on the status we validated against: a concurrent
        // writer that moved the run in between turns this into a no-op.
        let row = diesel::update(
            sr::sync_run
                .filter(sr::id.eq(id))
                .filter(sr::status.eq(current.status.as_str())),
        )
        .set(&changes)
        .returning(SyncRunRow::as_returning())
        .get_result(conn)
        .optional()?;

        Ok(row.map(SyncRun::from))
    }

    fn latest(&self, conn: &mut SqliteConnection) -> RepoResult<Option<SyncRun>> {
        let row = sr::sync_run
            .order(sr::id.desc())
            .select(SyncRunRow::as_select())
            .first(conn)
            .optional()?;
        Ok(row.map(SyncRun::from))
    }

    fn active(&self, conn: &mut SqliteConnection) -> RepoResult<Option<SyncRun>> {
        let row = sr::sync_run
            .filter(sr::status.eq_any(ACTIVE))
            .order(sr::id.desc())
            .select(SyncRunRow::as_select())
            .first(conn)
            .optional()?;
        Ok(row.map(SyncRun::from))
    }

    fn list_recent(&self, conn: &mut SqliteConnection, limit: i64) -> RepoResult<Vec<SyncRun>> {
        let rows = sr::sync_run
            .order(sr::id.desc())
            .limit(limit.max(0))
            .select(SyncRunRow::as_select())
            .load(conn)?;
        Ok(rows.into_iter().map(SyncRun::from).collect())
    }

    fn list_active_before(
        &self,
        conn: &mut SqliteConnection,
        cutoff: &str,
    ) -> RepoResult<Vec<SyncRun>> {
        let rows = sr::sync_run
            .filter(sr::status.eq_any(ACTIVE))
            .filter(sr::updated_at.lt(cutoff))
            .order(sr::id.asc())
            .select(SyncRunRow::as_select())
            .load(conn)?;
        Ok(rows.into_iter().map(SyncRun::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connection::connect_sqlite, migrate};

    fn conn() -> (tempfile::TempDir, SqliteConnection) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("log.db").to_string_lossy().to_string();
        migrate::run_sqlite(&path).unwrap();
        let conn = connect_sqlite(&path).unwrap();
        (dir, conn)
    }

    #[test]
    fn create_starts_a_fresh_run() {
        let (_dir, mut c) = conn();
        let log = SqliteSyncLog::new();

        let run = log.create(&mut c, "Initializing...").unwrap();
        assert_eq!(run.status, SyncStatus::Started);
        assert_eq!(run.count, 0);
        assert_eq!(run.total, None);
        assert_eq!(run.created_at, run.updated_at);
        assert_eq!(log.active(&mut c).unwrap(), Some(run.clone()));
        assert_eq!(log.latest(&mut c).unwrap(), Some(run));
    }

    #[test]
    fn count_never_decreases() {
        let (_dir, mut c) = conn();
        let log = SqliteSyncLog::new();
        let run = log.create(&mut c, "x").unwrap();

        log.update(&mut c, run.id, &SyncRunUpdate::default().count(7)).unwrap();
        let after = log
            .update(&mut c, run.id, &SyncRunUpdate::default().count(3).message("late"))
            .unwrap()
            .unwrap();
        assert_eq!(after.count, 7);
        assert_eq!(after.message, "late");
    }

    #[test]
    fn invalid_transitions_are_no_ops() {
        let (_dir, mut c) = conn();
        let log = SqliteSyncLog::new();
        let run = log.create(&mut c, "x").unwrap();

        let skip = SyncRunUpdate::default().status(SyncStatus::Cancelled);
        assert_eq!(log.update(&mut c, run.id, &skip).unwrap(), None);
        assert_eq!(log.get(&mut c, run.id).unwrap().unwrap().status, SyncStatus::Started);
    }

    #[test]
    fn unknown_run_is_reported() {
        let (_dir, mut c) = conn();
        let err = SqliteSyncLog::new()
            .update(&mut c, 404, &SyncRunUpdate::default().count(1))
            .unwrap_err();
        assert_eq!(err.downcast_ref::<RepoError>(), Some(&RepoError::RunNotFound(404)));
    }
}
