//! Catalog rows.

use diesel::prelude::*;
use serde::Serialize;

use crate::schema::diamond;

/// A row in [`crate::schema::diamond`] as read back from the database.
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Selectable, Serialize)]
#[diesel(table_name = diamond, check_for_backend(diesel::sqlite::Sqlite))]
pub struct Diamond {
    /// Database primary key. Populated by the DB.
    pub id: i32,
    /// Supplier stock identifier (unique upsert key).
    pub stock_id: String,
    pub shape: String,
    pub carat: f64,
    pub color: String,
    pub clarity: String,
    pub cut: String,
    pub polish: String,
    pub symmetry: String,
    pub fluorescence: String,
    pub lab: String,
    pub certificate_no: String,
    pub rap_price: Option<f64>,
    pub discount: Option<f64>,
    pub price_per_carat: f64,
    pub total_price: f64,
    pub measurements: Option<String>,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub depth: Option<f64>,
    pub depth_percent: Option<f64>,
    pub table_percent: Option<f64>,
    pub ratio: Option<f64>,
    pub image_url: String,
    pub video_url: String,
    pub certificate_url: String,
    pub status: String,
    pub location: String,
    pub comment: String,
    pub fancy_color: Option<String>,
    pub fancy_intensity: Option<String>,
    pub fancy_overtone: Option<String>,
    /// RFC3339 UTC timestamp of the sync that last wrote this row.
    pub synced_at: String,
}

/// Normalized catalog record produced by the transformer; insertable and usable
/// as a full-replacement changeset.
///
/// `treat_none_as_null` makes an upsert overwrite optional columns with NULL
/// when the latest snapshot no longer carries them, instead of keeping stale
/// values.
#[derive(Debug, Clone, PartialEq, Insertable, AsChangeset)]
#[diesel(table_name = diamond, treat_none_as_null = true)]
pub struct CatalogRecord {
    pub stock_id: String,
    pub shape: String,
    pub carat: f64,
    pub color: String,
    pub clarity: String,
    pub cut: String,
    pub polish: String,
    pub symmetry: String,
    pub fluorescence: String,
    pub lab: String,
    pub certificate_no: String,
    pub rap_price: Option<f64>,
    pub discount: Option<f64>,
    pub price_per_carat: f64,
    pub total_price: f64,
    pub measurements: Option<String>,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub depth: Option<f64>,
    pub depth_percent: Option<f64>,
    pub table_percent: Option<f64>,
    pub ratio: Option<f64>,
    pub image_url: String,
    pub video_url: String,
    pub certificate_url: String,
    pub status: String,
    pub location: String,
    pub comment: String,
    pub fancy_color: Option<String>,
    pub fancy_intensity: Option<String>,
    pub fancy_overtone: Option<String>,
    pub synced_at: String,
}

impl CatalogRecord {
    /// A record carrying only its key; every other field at its default.
    pub fn blank(stock_id: impl Into<String>, synced_at: impl Into<String>) -> Self {
        Self {
            stock_id: stock_id.into(),
            shape: String::new(),
            carat: 0.0,
            color: String::new(),
            clarity: String::new(),
            cut: String::new(),
            polish: String::new(),
            symmetry: String::new(),
            fluorescence: String::new(),
            lab: String::new(),
            certificate_no: String::new(),
            rap_price: None,
            discount: None,
            price_per_carat: 0.0,
            total_price: 0.0,
            measurements: None,
            length: None,
            width: None,
            depth: None,
            depth_percent: None,
            table_percent: None,
            ratio: None,
            image_url: String::new(),
            video_url: String::new(),
            certificate_url: String::new(),
            status: String::new(),
            location: String::new(),
            comment: String::new(),
            fancy_color: None,
            fancy_intensity: None,
            fancy_overtone: None,
            synced_at: synced_at.into(),
        }
    }
}
