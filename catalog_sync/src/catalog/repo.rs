//! Catalog repository: idempotent upserts keyed by `stock_id`.
use diesel::prelude::*;
use diesel::{SqliteConnection, insert_into};
use serde::Serialize;

use crate::errors::RepoResult;
use crate::models::diamond::{CatalogRecord, Diamond};
use crate::schema::diamond;

/// Read-only catalog figures for dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    /// Rows currently in the catalog.
    pub total_records: i64,
}

/// Portable surface, SQLite implementation is [`SqliteCatalogRepo`].
pub trait CatalogRepo {
    /// Inserts the record, or fully replaces every mapped column of the row
    /// with the same `stock_id`. Repeating the call is a no-op.
    fn upsert(&self, conn: &mut SqliteConnection, record: &CatalogRecord) -> RepoResult<()>;

    /// Looks up one row by stock id.
    fn get(&self, conn: &mut SqliteConnection, stock_id: &str) -> RepoResult<Option<Diamond>>;

    /// Catalog totals.
    fn stats(&self, conn: &mut SqliteConnection) -> RepoResult<CatalogStats>;
}

impl<T: CatalogRepo + ?Sized> CatalogRepo for &T {
    fn upsert(&self, conn: &mut SqliteConnection, record: &CatalogRecord) -> RepoResult<()> {
        (**self).upsert(conn, record)
    }

    fn get(&self, conn: &mut SqliteConnection, stock_id: &str) -> RepoResult<Option<Diamond>> {
        (**self).get(conn, stock_id)
    }

    fn stats(&self, conn: &mut SqliteConnection) -> RepoResult<CatalogStats> {
        (**self).stats(conn)
    }
}

/// SQLite-backed [`CatalogRepo`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteCatalogRepo;

impl SqliteCatalogRepo {
    pub fn new() -> Self {
        Self
    }
}

impl CatalogRepo for SqliteCatalogRepo {
    fn upsert(&self, conn: &mut SqliteConnection, record: &CatalogRecord) -> RepoResult<()> {
        // INSERT .. ON CONFLICT (stock_id) DO UPDATE SET <every mapped column>
        insert_into(diamond::table)
            .values(record)
            .on_conflict(diamond::stock_id)
            .do_update()
            .set(record)
            .execute(conn)?;
        Ok(())
    }

    fn get(&self, conn: &mut SqliteConnection, stock_id: &str) -> RepoResult<Option<Diamond>> {
        let row = diamond::table
            .filter(diamond::stock_id.eq(stock_id))
            .select(Diamond::as_select())
            .first(conn)
            .optional()?;
        Ok(row)
    }

    fn stats(&self, conn: &mut SqliteConnection) -> RepoResult<CatalogStats> {
        let total_records: i64 = diamond::table.count().get_result(conn)?;
        Ok(CatalogStats { total_records })
    }
}
