//! Run control that needs only the run log: stop requests and stale-run
//! recovery. Usable without an inventory source (CLI `stop` / `reap`).

use diesel::SqliteConnection;

use crate::{
    errors::RepoError,
    models::sync_run::{SyncRun, SyncRunUpdate, SyncStatus},
    sync::StopOutcome,
    sync_log::SyncLogStore,
    tz,
};

/// Asks a running sync to stop at its next batch boundary.
///
/// Leaves `count` and `message` alone. Stopping or finished runs are left
/// untouched.
pub fn request_stop<L: SyncLogStore>(
    log: &L,
    conn: &mut SqliteConnection,
    run_id: i32,
) -> anyhow::Result<StopOutcome> {
    let run = log.get(conn, run_id)?.ok_or(RepoError::RunNotFound(run_id))?;

    let outcome = match run.status {
        SyncStatus::Started => {
            let stop = SyncRunUpdate::default().status(SyncStatus::Stopping);
            match log.update(conn, run_id, &stop)? {
                Some(run) => StopOutcome::Requested(run),
                None => {
                    let current = log.get(conn, run_id)?.ok_or(RepoError::RunNotFound(run_id))?;
                    stop_noop(current.status)
                }
            }
        }
        status => stop_noop(status),
    };

    match &outcome {
        StopOutcome::Requested(_) => tracing::info!(run_id, "stop requested"),
        other => tracing::debug!(run_id, outcome = ?other, "stop request ignored"),
    }
    Ok(outcome)
}

/// Resolves runs that have been active without a write for longer than
/// `older_than`: `STARTED` becomes `FAILED`, `STOPPING` becomes `CANCELLED`.
///
/// A crashed worker otherwise leaves its run active forever and blocks every
/// later start. Returns the runs it resolved.
pub fn reap_stale_runs<L: SyncLogStore>(
    log: &L,
    conn: &mut SqliteConnection,
    older_than: chrono::Duration,
) -> anyhow::Result<Vec<SyncRun>> {
    let cutoff = tz::to_rfc3339_millis(chrono::Utc::now() - older_than);
    let mut reaped = Vec::new();

    for run in log.list_active_before(conn, &cutoff)? {
        let update = match run.status {
            SyncStatus::Started => SyncRunUpdate::default()
                .status(SyncStatus::Failed)
                .message(format!("Sync abandoned: no progress since {}", run.updated_at)),
            SyncStatus::Stopping => SyncRunUpdate::default()
                .status(SyncStatus::Cancelled)
                .message(format!("Cancelled: no progress since {}", run.updated_at)),
            _ => continue,
        };
        if let Some(resolved) = log.update(conn, run.id, &update)? {
            let idle_mins = tz::parse_ts_to_utc(&run.updated_at)
                .map(|t| (chrono::Utc::now() - t).num_minutes())
                .ok();
            tracing::warn!(
                run_id = resolved.id,
                status = %resolved.status,
                idle_mins,
                "reaped stale sync run"
            );
            reaped.push(resolved);
        }
    }
    Ok(reaped)
}

fn stop_noop(status: SyncStatus) -> StopOutcome {
    if status == SyncStatus::Stopping {
        StopOutcome::AlreadyStopping
    } else {
        StopOutcome::AlreadyFinished(status)
    }
}
