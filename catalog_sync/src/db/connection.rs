//! SQLite connection setup shared by the CLI, the sync service and tests.
//!
//! Status pollers read while the sync worker writes, so every connection runs
//! in WAL mode and waits on locks instead of failing with `SQLITE_BUSY`.
//!
//! ```no_run
//! use catalog_sync::db::connection::connect_sqlite;
//!
//! let conn = connect_sqlite("sqlite://catalog.db");
//! assert!(conn.is_ok());
//! ```

use anyhow::Context;
use diesel::{Connection, SqliteConnection, connection::SimpleConnection};

/// `journal_mode` sticks to the database file; the others are per connection.
const CONNECTION_PRAGMAS: &str = "\
    PRAGMA journal_mode = WAL;\
    PRAGMA synchronous = NORMAL;\
    PRAGMA foreign_keys = ON;\
    PRAGMA busy_timeout = 5000;";

/// Opens `database_url` (a bare path or a `sqlite:`/`sqlite://` URL) and
/// applies the connection PRAGMAs.
pub fn connect_sqlite(database_url: &str) -> anyhow::Result<SqliteConnection> {
    let path = sqlite_path(database_url);
    let mut conn = SqliteConnection::establish(path)
        .with_context(|| format!("opening sqlite database {path}"))?;
    conn.batch_execute(CONNECTION_PRAGMAS)
        .with_context(|| format!("configuring sqlite database {path}"))?;
    Ok(conn)
}

/// Strips a `sqlite://` or `sqlite:` scheme, leaving what `establish` expects.
pub fn sqlite_path(database_url: &str) -> &str {
    database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::{QueryableByName, RunQueryDsl, sql_query, sql_types::Integer};

    #[derive(QueryableByName)]
    struct Synchronous {
        #[diesel(sql_type = Integer)]
        synchronous: i32,
    }

    #[test]
    fn strips_sqlite_scheme() {
        assert_eq!(sqlite_path("sqlite:///tmp/a.db"), "/tmp/a.db");
        assert_eq!(sqlite_path("sqlite:catalog.db"), "catalog.db");
        assert_eq!(sqlite_path("catalog.db"), "catalog.db");
        assert_eq!(sqlite_path(":memory:"), ":memory:");
    }

    #[test]
    fn pragmas_apply_per_connection() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("c.db").display());
        let mut conn = connect_sqlite(&url).unwrap();

        // NORMAL
        let s: Synchronous = sql_query("PRAGMA synchronous;").get_result(&mut conn).unwrap();
        assert_eq!(s.synchronous, 1);
    }

    #[test]
    fn unreachable_path_names_the_database() {
        let err = connect_sqlite("/nonexistent-dir/for/sure/c.db").err().expect("expected connect to fail");
        assert!(format!("{err:#}").contains("/nonexistent-dir/for/sure/c.db"));
    }
}
