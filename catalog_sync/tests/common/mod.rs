#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use catalog_sync::{
    catalog::repo::{CatalogRepo, CatalogStats, SqliteCatalogRepo},
    db::{connection, migrate},
    errors::RepoResult,
    models::{
        diamond::{CatalogRecord, Diamond},
        sync_run::{SyncRun, SyncRunUpdate, SyncStatus},
    },
    sync::{StartOutcome, SyncOptions, SyncOrchestrator},
    sync_log::{SqliteSyncLog, SyncLogStore},
};
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::{Integer, Text};
use serde_json::{Value, json};
use supplier_client::{
    errors::FetchError, models::raw_record::RawRecord, providers::InventorySource,
};
use tempfile::TempDir;

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}

pub struct TestDb {
    _dir: TempDir,    // keep alive for the life of the test
    pub path: String, // <tmpdir>/test.db
}

impl TestDb {
    pub fn connect(&self) -> SqliteConnection {
        connection::connect_sqlite(&self.path).expect("connect")
    }
}

pub fn setup_db() -> (TestDb, SqliteConnection) {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("test.db");
    let path = p.to_string_lossy().to_string();

    migrate::run_sqlite(&path).expect("migrations");

    let conn = connection::connect_sqlite(&path).expect("connect");
    (TestDb { _dir: dir, path }, conn)
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    use diesel::sql_query;

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal"); // WAL is persistent per DB file

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}

pub fn diamond_count(conn: &mut SqliteConnection) -> i64 {
    SqliteCatalogRepo::new().stats(conn).unwrap().total_records
}

pub fn run_count(conn: &mut SqliteConnection) -> i64 {
    use catalog_sync::schema::sync_run;
    sync_run::table.count().get_result(conn).unwrap()
}

/// Supplier-shaped record with the given stock id (or none).
pub fn raw(stock_id: Option<&str>, carat: f64) -> RawRecord {
    let mut v = json!({
        "Shape": "Round",
        "Carat": carat,
        "Color": "f",
        "Clarity": "vs2",
        "Lab": "GIA",
        "Price": 4200,
    });
    if let Some(id) = stock_id {
        v["Stock #"] = Value::String(id.to_string());
    }
    RawRecord::from_value(v)
}

/// `n` records `S-000 .. S-(n-1)`.
pub fn inventory(n: usize) -> Vec<RawRecord> {
    (0..n).map(|i| raw(Some(&format!("S-{i:03}")), 1.0)).collect()
}

/// Inventory source replaying a fixed outcome.
pub struct FixedSource {
    outcome: Box<dyn Fn() -> Result<Vec<RawRecord>, FetchError> + Send + Sync>,
    pub calls: AtomicUsize,
}

impl FixedSource {
    pub fn records(records: Vec<RawRecord>) -> Self {
        Self::from_fn(move || Ok(records.clone()))
    }

    pub fn failing(detail: &'static str) -> Self {
        Self::from_fn(move || {
            Err(FetchError::Shape {
                detail: detail.to_string(),
            })
        })
    }

    fn from_fn(f: impl Fn() -> Result<Vec<RawRecord>, FetchError> + Send + Sync + 'static) -> Self {
        Self {
            outcome: Box::new(f),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl InventorySource for FixedSource {
    async fn fetch_inventory(&self) -> Result<Vec<RawRecord>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.outcome)()
    }
}

/// Catalog wrapper that fails chosen stock ids and can request a stop for a
/// run after a given number of upserts.
#[derive(Default)]
pub struct ScriptedCatalog {
    pub fail_ids: Vec<String>,
    pub stop_after: Option<(usize, i32)>,
    pub upserts: AtomicUsize,
}

impl ScriptedCatalog {
    pub fn failing(ids: &[&str]) -> Self {
        Self {
            fail_ids: ids.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn stopping(run_id: i32, after_upserts: usize) -> Self {
        Self {
            stop_after: Some((after_upserts, run_id)),
            ..Default::default()
        }
    }
}

impl CatalogRepo for ScriptedCatalog {
    fn upsert(&self, conn: &mut SqliteConnection, record: &CatalogRecord) -> RepoResult<()> {
        if self.fail_ids.iter().any(|id| *id == record.stock_id) {
            anyhow::bail!("disk full");
        }
        SqliteCatalogRepo::new().upsert(conn, record)?;

        let done = self.upserts.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((after, run_id)) = self.stop_after {
            if done == after {
                let stop = SyncRunUpdate::default().status(SyncStatus::Stopping);
                SqliteSyncLog::new().update(conn, run_id, &stop)?;
            }
        }
        Ok(())
    }

    fn get(&self, conn: &mut SqliteConnection, stock_id: &str) -> RepoResult<Option<Diamond>> {
        SqliteCatalogRepo::new().get(conn, stock_id)
    }

    fn stats(&self, conn: &mut SqliteConnection) -> RepoResult<CatalogStats> {
        SqliteCatalogRepo::new().stats(conn)
    }
}

/// Opens a run without executing it.
pub fn begin_run(conn: &mut SqliteConnection) -> SyncRun {
    let opener = SyncOrchestrator::new(FixedSource::records(vec![]), SyncOptions::default());
    match opener.begin(conn).expect("begin") {
        StartOutcome::Started(run) => run,
        other => panic!("expected a fresh run, got {other:?}"),
    }
}

pub fn options(batch_size: usize) -> SyncOptions {
    SyncOptions {
        batch_size,
        ..SyncOptions::default()
    }
}
