use diesel::SqliteConnection;
use supplier_client::{errors::FetchError, models::raw_record::RawRecord, providers::InventorySource};

use crate::{
    catalog::{
        repo::{CatalogRepo, SqliteCatalogRepo},
        transform::{TransformError, transform},
    },
    errors::{RepoError, is_unique_violation},
    models::sync_run::{SyncRun, SyncRunUpdate, SyncStatus},
    sync::{
        INITIALIZING, RunOutcome, RunReport, StartOutcome, StopOutcome, SyncOptions,
        conflict_message, control,
    },
    sync_log::{SqliteSyncLog, SyncLogStore},
    tz,
};

/// Drives sync runs against one inventory source.
///
/// Every database call goes through the connection passed in by the caller;
/// the orchestrator holds no catalog state between records.
pub struct SyncOrchestrator<S, C = SqliteCatalogRepo, L = SqliteSyncLog> {
    source: S,
    catalog: C,
    log: L,
    options: SyncOptions,
}

/// Running totals of one execution.
#[derive(Debug, Default)]
struct Tally {
    processed: usize,
    count: i32,
    skipped: usize,
    errors: Vec<String>,
}

impl Tally {
    fn error_count(&self) -> i32 {
        to_i32(self.errors.len())
    }
}

impl<S: InventorySource> SyncOrchestrator<S> {
    /// Orchestrator over the SQLite catalog and run log.
    pub fn new(source: S, options: SyncOptions) -> Self {
        Self::with_stores(source, SqliteCatalogRepo::new(), SqliteSyncLog::new(), options)
    }
}

impl<S, C, L> SyncOrchestrator<S, C, L>
where
    S: InventorySource,
    C: CatalogRepo,
    L: SyncLogStore,
{
    pub fn with_stores(source: S, catalog: C, log: L, mut options: SyncOptions) -> Self {
        options.batch_size = options.batch_size.max(1);
        Self {
            source,
            catalog,
            log,
            options,
        }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    /// Opens a new run unless one is already active.
    ///
    /// The active-run check and the insert share one `BEGIN IMMEDIATE`
    /// transaction, and the `sync_run_single_active` index rejects a second
    /// active row should another writer slip through; both paths report
    /// [`StartOutcome::Conflict`]. Stale runs are reaped first when
    /// [`SyncOptions::stale_after`] is set.
    pub fn begin(&self, conn: &mut SqliteConnection) -> anyhow::Result<StartOutcome> {
        if let Some(older_than) = self.options.stale_after {
            self.reap_stale_runs(conn, older_than)?;
        }

        let attempt = conn.immediate_transaction(|conn| -> anyhow::Result<StartOutcome> {
            if let Some(active) = self.log.active(conn)? {
                return Ok(StartOutcome::Conflict {
                    message: conflict_message(&active),
                    active,
                });
            }
            Ok(StartOutcome::Started(self.log.create(conn, INITIALIZING)?))
        });

        let outcome = match attempt {
            Err(err) if is_unique_violation(&err) => match self.log.active(conn)? {
                Some(active) => StartOutcome::Conflict {
                    message: conflict_message(&active),
                    active,
                },
                None => return Err(err),
            },
            other => other?,
        };

        match &outcome {
            StartOutcome::Started(run) => tracing::info!(run_id = run.id, "sync run started"),
            StartOutcome::Conflict { active, .. } => tracing::warn!(
                active_run_id = active.id,
                status = %active.status,
                "sync already in progress, not starting another"
            ),
        }
        Ok(outcome)
    }

    /// Executes a run previously opened with [`Self::begin`].
    ///
    /// Supplier failures and record failures end up in the persisted run and
    /// the returned report. `Err` is reserved for infrastructure failures (the
    /// database going away mid-run); the run is then marked failed on a best
    /// effort basis.
    ///
    /// The record loop runs inline on the calling task. Callers sharing an
    /// executor with other work should use [`Self::prepare`], [`Self::fetch`]
    /// and [`Self::ingest`] and move the last one onto a blocking thread.
    pub async fn execute(
        &self,
        conn: &mut SqliteConnection,
        run_id: i32,
    ) -> anyhow::Result<RunReport> {
        if let Some(report) = self.prepare(conn, run_id)? {
            return Ok(report);
        }
        let fetched = self.fetch(run_id).await;
        self.ingest(conn, run_id, fetched)
    }

    /// Checks that `run_id` can be executed.
    ///
    /// Returns the final report when a stop requested before execution has
    /// already been honoured; the run is then `CANCELLED` and nothing is fetched.
    pub fn prepare(
        &self,
        conn: &mut SqliteConnection,
        run_id: i32,
    ) -> anyhow::Result<Option<RunReport>> {
        let run = self.current(conn, run_id)?;
        match run.status {
            SyncStatus::Started => Ok(None),
            SyncStatus::Stopping => {
                tracing::info!(run_id, "stop requested before execution");
                self.cancel(conn, run_id, None, &Tally::default()).map(Some)
            }
            status => Err(RepoError::RunNotExecutable { id: run_id, status }.into()),
        }
    }

    /// Pulls the full supplier inventory. Touches no database.
    pub async fn fetch(&self, run_id: i32) -> Result<Vec<RawRecord>, FetchError> {
        tracing::info!(run_id, "fetching supplier inventory");
        self.source.fetch_inventory().await
    }

    /// Records the fetch outcome and runs the record loop to a terminal state.
    ///
    /// Blocking: every record is a synchronous SQLite write.
    pub fn ingest(
        &self,
        conn: &mut SqliteConnection,
        run_id: i32,
        fetched: Result<Vec<RawRecord>, FetchError>,
    ) -> anyhow::Result<RunReport> {
        match self.process_records(conn, run_id, fetched) {
            Ok(report) => Ok(report),
            Err(err) => {
                tracing::error!(run_id, error = %format!("{err:#}"), "sync run aborted");
                self.abandon(conn, run_id, &err);
                Err(err)
            }
        }
    }

    /// [`Self::begin`] followed by [`Self::execute`] on the same connection.
    pub async fn run(&self, conn: &mut SqliteConnection) -> anyhow::Result<RunOutcome> {
        match self.begin(conn)? {
            StartOutcome::Started(run) => {
                Ok(RunOutcome::Finished(self.execute(conn, run.id).await?))
            }
            StartOutcome::Conflict { active, message } => {
                Ok(RunOutcome::Conflict { active, message })
            }
        }
    }

    /// See [`control::request_stop`].
    pub fn request_stop(
        &self,
        conn: &mut SqliteConnection,
        run_id: i32,
    ) -> anyhow::Result<StopOutcome> {
        control::request_stop(&self.log, conn, run_id)
    }

    /// See [`control::reap_stale_runs`].
    pub fn reap_stale_runs(
        &self,
        conn: &mut SqliteConnection,
        older_than: chrono::Duration,
    ) -> anyhow::Result<Vec<SyncRun>> {
        control::reap_stale_runs(&self.log, conn, older_than)
    }

    fn process_records(
        &self,
        conn: &mut SqliteConnection,
        run_id: i32,
        fetched: Result<Vec<RawRecord>, FetchError>,
    ) -> anyhow::Result<RunReport> {
        let records = match fetched {
            Ok(records) => records,
            Err(err) => return self.fail_fetch(conn, run_id, &err),
        };

        let total = records.len();
        tracing::info!(run_id, total, "inventory fetched");
        self.log.update(
            conn,
            run_id,
            &SyncRunUpdate::default()
                .total(to_i32(total))
                .message(format!("Fetched {total} records, processing")),
        )?;

        let synced_at = tz::now_rfc3339();
        let mut tally = Tally::default();
        for (i, raw) in records.iter().enumerate() {
            if i % self.options.batch_size == 0 {
                if let Some(report) = self.checkpoint(conn, run_id, total, &tally)? {
                    return Ok(report);
                }
            }
            self.process(conn, run_id, raw, &synced_at, &mut tally);
        }

        self.finish(conn, run_id, total, &tally)
    }

    /// Batch boundary: honour a pending stop, otherwise persist progress.
    fn checkpoint(
        &self,
        conn: &mut SqliteConnection,
        run_id: i32,
        total: usize,
        tally: &Tally,
    ) -> anyhow::Result<Option<RunReport>> {
        let run = self.current(conn, run_id)?;
        match run.status {
            SyncStatus::Started => {
                if tally.processed > 0 {
                    let progress = SyncRunUpdate::default()
                        .count(tally.count)
                        .error_count(tally.error_count())
                        .message(format!("Processing {}/{total}", tally.processed));
                    self.log.update(conn, run_id, &progress)?;
                    tracing::debug!(
                        run_id,
                        processed = tally.processed,
                        total,
                        count = tally.count,
                        "progress"
                    );
                }
                Ok(None)
            }
            SyncStatus::Stopping => self.cancel(conn, run_id, Some(total), tally).map(Some),
            status => {
                tracing::warn!(run_id, %status, "run was resolved elsewhere, stopping");
                Ok(Some(report(&run, tally)))
            }
        }
    }

    fn process(
        &self,
        conn: &mut SqliteConnection,
        run_id: i32,
        raw: &RawRecord,
        synced_at: &str,
        tally: &mut Tally,
    ) {
        tally.processed += 1;
        let record = match transform(raw, synced_at) {
            Ok(record) => record,
            Err(TransformError::MissingIdentifier) => {
                tally.skipped += 1;
                tracing::debug!(run_id, position = tally.processed, "skipping record without stock id");
                return;
            }
        };

        match self.catalog.upsert(conn, &record) {
            Ok(()) => tally.count = tally.count.saturating_add(1),
            Err(err) => {
                tracing::warn!(
                    run_id,
                    stock_id = %record.stock_id,
                    error = %format!("{err:#}"),
                    "record upsert failed"
                );
                tally.errors.push(format!("{}: {err:#}", record.stock_id));
            }
        }
    }

    fn finish(
        &self,
        conn: &mut SqliteConnection,
        run_id: i32,
        total: usize,
        tally: &Tally,
    ) -> anyhow::Result<RunReport> {
        let (status, message) = if tally.errors.is_empty() {
            (SyncStatus::Completed, completed_message(total, tally))
        } else {
            (
                SyncStatus::CompletedWithErrors,
                completed_with_errors_message(total, tally, self.options.max_error_details),
            )
        };
        let update = SyncRunUpdate::default()
            .status(status)
            .count(tally.count)
            .error_count(tally.error_count())
            .message(message);

        if let Some(run) = self.log.update(conn, run_id, &update)? {
            tracing::info!(
                run_id,
                %status,
                count = tally.count,
                errors = tally.errors.len(),
                skipped = tally.skipped,
                "sync run finished"
            );
            return Ok(report(&run, tally));
        }

        // A stop that arrived after the last checkpoint still wins.
        let current = self.current(conn, run_id)?;
        if current.status == SyncStatus::Stopping {
            return self.cancel(conn, run_id, Some(total), tally);
        }
        tracing::warn!(run_id, status = %current.status, "run was resolved elsewhere");
        Ok(report(&current, tally))
    }

    fn cancel(
        &self,
        conn: &mut SqliteConnection,
        run_id: i32,
        total: Option<usize>,
        tally: &Tally,
    ) -> anyhow::Result<RunReport> {
        let message = match total {
            Some(total) => format!(
                "Cancelled after processing {} of {total} records ({} synced)",
                tally.processed, tally.count
            ),
            None => "Cancelled before processing any records".to_string(),
        };
        let update = SyncRunUpdate::default()
            .status(SyncStatus::Cancelled)
            .count(tally.count)
            .error_count(tally.error_count())
            .message(message);

        let run = self.resolve(conn, run_id, &update)?;
        tracing::info!(
            run_id,
            processed = tally.processed,
            count = tally.count,
            "sync run cancelled"
        );
        Ok(report(&run, tally))
    }

    fn fail_fetch(
        &self,
        conn: &mut SqliteConnection,
        run_id: i32,
        err: &FetchError,
    ) -> anyhow::Result<RunReport> {
        tracing::error!(run_id, error = %err, "inventory fetch failed");
        let failed = SyncRunUpdate::default()
            .status(SyncStatus::Failed)
            .message(format!("Sync failed: {err}"));

        let run = match self.log.update(conn, run_id, &failed)? {
            Some(run) => run,
            None => {
                let current = self.current(conn, run_id)?;
                if current.status == SyncStatus::Stopping {
                    let cancelled = SyncRunUpdate::default()
                        .status(SyncStatus::Cancelled)
                        .message(format!("Cancelled; inventory fetch failed: {err}"));
                    self.resolve(conn, run_id, &cancelled)?
                } else {
                    current
                }
            }
        };
        Ok(report(&run, &Tally::default()))
    }

    /// Best-effort terminal write after an infrastructure failure.
    fn abandon(&self, conn: &mut SqliteConnection, run_id: i32, err: &anyhow::Error) {
        let message = format!("Sync failed: {err:#}");
        let failed = SyncRunUpdate::default()
            .status(SyncStatus::Failed)
            .message(message.clone());
        let cancelled = SyncRunUpdate::default()
            .status(SyncStatus::Cancelled)
            .message(message);

        let outcome = self
            .log
            .update(conn, run_id, &failed)
            .and_then(|run| match run {
                Some(_) => Ok(None),
                None => self.log.update(conn, run_id, &cancelled),
            });
        if let Err(e) = outcome {
            tracing::warn!(run_id, error = %format!("{e:#}"), "could not record run failure");
        }
    }

    /// Applies `update`; when it is a no-op, returns the run as persisted.
    fn resolve(
        &self,
        conn: &mut SqliteConnection,
        run_id: i32,
        update: &SyncRunUpdate,
    ) -> anyhow::Result<SyncRun> {
        match self.log.update(conn, run_id, update)? {
            Some(run) => Ok(run),
            None => self.current(conn, run_id),
        }
    }

    fn current(&self, conn: &mut SqliteConnection, run_id: i32) -> anyhow::Result<SyncRun> {
        Ok(self
            .log
            .get(conn, run_id)?
            .ok_or(RepoError::RunNotFound(run_id))?)
    }
}

fn report(run: &SyncRun, tally: &Tally) -> RunReport {
    RunReport {
        run_id: run.id,
        status: run.status,
        count: run.count,
        total: run.total,
        processed: tally.processed,
        skipped: tally.skipped,
        errors: tally.errors.clone(),
        message: run.message.clone(),
    }
}

fn skipped_suffix(tally: &Tally) -> String {
    match tally.skipped {
        0 => String::new(),
        n => format!(", {n} skipped without stock id"),
    }
}

fn completed_message(total: usize, tally: &Tally) -> String {
    format!(
        "Sync completed: {} of {total} records synced{}",
        tally.count,
        skipped_suffix(tally)
    )
}

fn completed_with_errors_message(total: usize, tally: &Tally, max_details: usize) -> String {
    let mut message = format!(
        "Sync completed with errors: {} of {total} records synced, {} failed{}",
        tally.count,
        tally.errors.len(),
        skipped_suffix(tally)
    );
    if max_details > 0 {
        let shown: Vec<&str> = tally.errors.iter().take(max_details).map(String::as_str).collect();
        message.push_str("; first errors: ");
        message.push_str(&shown.join("; "));
        let hidden = tally.errors.len().saturating_sub(max_details);
        if hidden > 0 {
            message.push_str(&format!(" (+{hidden} more)"));
        }
    }
    message
}

fn to_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(count: i32, skipped: usize, errors: &[&str]) -> Tally {
        Tally {
            processed: 0,
            count,
            skipped,
            errors: errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn completion_message_mentions_skips_only_when_present() {
        assert_eq!(
            completed_message(10, &tally(10, 0, &[])),
            "Sync completed: 10 of 10 records synced"
        );
        assert_eq!(
            completed_message(10, &tally(8, 2, &[])),
            "Sync completed: 8 of 10 records synced, 2 skipped without stock id"
        );
    }

    #[test]
    fn error_summary_is_capped() {
        let t = tally(22, 2, &["A: boom"]);
        assert_eq!(
            completed_with_errors_message(25, &t, 5),
            "Sync completed with errors: 22 of 25 records synced, 1 failed, \
             2 skipped without stock id; first errors: A: boom"
        );

        let t = tally(0, 0, &["A: x", "B: y", "C: z"]);
        assert_eq!(
            completed_with_errors_message(3, &t, 2),
            "Sync completed with errors: 0 of 3 records synced, 3 failed; \
             first errors: A: x; B: y (+1 more)"
        );
        assert_eq!(
            completed_with_errors_message(3, &t, 0),
            "Sync completed with errors: 0 of 3 records synced, 3 failed"
        );
    }
}
