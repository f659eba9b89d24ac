mod common;

use catalog_sync::{
    catalog::repo::{CatalogRepo, SqliteCatalogRepo},
    models::diamond::CatalogRecord,
};

const T1: &str = "2025-01-01T00:00:00.000Z";
const T2: &str = "2025-01-02T00:00:00.000Z";

fn record(stock_id: &str) -> CatalogRecord {
    CatalogRecord {
        shape: "Round".into(),
        carat: 1.01,
        color: "E".into(),
        clarity: "VS1".into(),
        lab: "GIA".into(),
        price_per_carat: 6000.0,
        total_price: 6060.0,
        measurements: Some("6.41 x 6.45 x 3.98".into()),
        fancy_color: Some("Yellow".into()),
        ..CatalogRecord::blank(stock_id, T1)
    }
}

#[test]
fn upsert_inserts_then_reads_back() {
    let (_db, mut conn) = common::setup_db();
    let repo = SqliteCatalogRepo::new();

    repo.upsert(&mut conn, &record("D-1")).unwrap();

    let got = repo.get(&mut conn, "D-1").unwrap().expect("row");
    assert_eq!(got.stock_id, "D-1");
    assert_eq!(got.carat, 1.01);
    assert_eq!(got.measurements.as_deref(), Some("6.41 x 6.45 x 3.98"));
    assert!(repo.get(&mut conn, "D-2").unwrap().is_none());
}

#[test]
fn upsert_is_idempotent() {
    let (_db, mut conn) = common::setup_db();
    let repo = SqliteCatalogRepo::new();

    repo.upsert(&mut conn, &record("D-1")).unwrap();
    let first = repo.get(&mut conn, "D-1").unwrap().unwrap();
    repo.upsert(&mut conn, &record("D-1")).unwrap();
    let second = repo.get(&mut conn, "D-1").unwrap().unwrap();

    assert_eq!(first, second);
    assert_eq!(repo.stats(&mut conn).unwrap().total_records, 1);
}

#[test]
fn upsert_fully_replaces_existing_row() {
    let (_db, mut conn) = common::setup_db();
    let repo = SqliteCatalogRepo::new();

    repo.upsert(&mut conn, &record("D-1")).unwrap();
    let original_id = repo.get(&mut conn, "D-1").unwrap().unwrap().id;

    // Latest snapshot dropped the optional fields and repriced.
    let replacement = CatalogRecord {
        total_price: 5000.0,
        ..CatalogRecord::blank("D-1", T2)
    };
    repo.upsert(&mut conn, &replacement).unwrap();

    let got = repo.get(&mut conn, "D-1").unwrap().unwrap();
    assert_eq!(got.id, original_id, "key row is never regenerated");
    assert_eq!(got.total_price, 5000.0);
    assert_eq!(got.shape, "");
    assert_eq!(got.measurements, None);
    assert_eq!(got.fancy_color, None);
    assert_eq!(got.synced_at, T2);
}

#[test]
fn stats_count_rows() {
    let (db, mut conn) = common::setup_db();
    let repo = SqliteCatalogRepo::new();
    for id in ["A", "B", "C"] {
        repo.upsert(&mut conn, &record(id)).unwrap();
    }

    // A reader on its own connection sees the committed rows.
    let mut reader = db.connect();
    assert_eq!(repo.stats(&mut reader).unwrap().total_records, 3);

    let json = serde_json::to_value(repo.stats(&mut reader).unwrap()).unwrap();
    assert_eq!(json, serde_json::json!({"totalRecords": 3}));
}
