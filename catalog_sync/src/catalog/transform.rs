//! Raw supplier record -> [`CatalogRecord`].
//!
//! The only record-level failure is a missing stock id. Every other field is
//! coerced: unreadable text becomes `""`, unreadable required numbers become
//! `0`, and optional attributes (Rapaport figures, measurements, fancy color)
//! become `None`.

use supplier_client::models::{field::Field, raw_record::RawRecord};

use crate::models::diamond::CatalogRecord;

/// Why a raw record could not be turned into a catalog record.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// The record carries no usable stock identifier; it is skipped.
    #[error("record has no stock identifier")]
    MissingIdentifier,
}

/// Normalizes one supplier record.
///
/// `synced_at` is stamped on the record so that every row written by one run
/// carries the same timestamp.
pub fn transform(raw: &RawRecord, synced_at: &str) -> Result<CatalogRecord, TransformError> {
    let stock_id = raw.identifier().ok_or(TransformError::MissingIdentifier)?;

    let text = |f: Field| raw.text(f).unwrap_or_default();
    let upper = |f: Field| raw.text(f).map(|s| s.to_uppercase()).unwrap_or_default();
    let opt_text = |f: Field| raw.text(f);
    let positive = |f: Field| raw.number(f).filter(|n| *n > 0.0);

    let carat = positive(Field::Carat).unwrap_or(0.0);
    let (price_per_carat, total_price) = prices(
        carat,
        positive(Field::PricePerCarat),
        positive(Field::TotalPrice),
    );

    let length = positive(Field::Length);
    let width = positive(Field::Width);
    let depth = positive(Field::Depth);

    let measurements = opt_text(Field::Measurements).or_else(|| match (length, width, depth) {
        (Some(l), Some(w), Some(d)) => Some(format!("{l} x {w} x {d}")),
        _ => None,
    });
    let ratio = positive(Field::Ratio).or_else(|| match (length, width) {
        (Some(l), Some(w)) => Some(round2(l.max(w) / l.min(w))).filter(|r| r.is_finite()),
        _ => None,
    });

    Ok(CatalogRecord {
        stock_id,
        shape: text(Field::Shape),
        carat,
        color: upper(Field::Color),
        clarity: upper(Field::Clarity),
        cut: text(Field::Cut),
        polish: text(Field::Polish),
        symmetry: text(Field::Symmetry),
        fluorescence: text(Field::Fluorescence),
        lab: upper(Field::Lab),
        certificate_no: text(Field::CertificateNo),
        rap_price: positive(Field::RapPrice),
        // Discounts are signed (negative below list).
        discount: raw.number(Field::Discount),
        price_per_carat,
        total_price,
        measurements,
        length,
        width,
        depth,
        depth_percent: positive(Field::DepthPercent),
        table_percent: positive(Field::TablePercent),
        ratio,
        image_url: text(Field::ImageUrl),
        video_url: text(Field::VideoUrl),
        certificate_url: text(Field::CertificateUrl),
        status: text(Field::Status),
        location: text(Field::Location),
        comment: text(Field::Comment),
        fancy_color: opt_text(Field::FancyColor),
        fancy_intensity: opt_text(Field::FancyIntensity),
        fancy_overtone: opt_text(Field::FancyOvertone),
        synced_at: synced_at.to_string(),
    })
}

/// Fills whichever of price-per-carat / total price is missing from the other.
fn prices(carat: f64, ppc: Option<f64>, total: Option<f64>) -> (f64, f64) {
    match (ppc, total) {
        (Some(p), Some(t)) => (p, t),
        (Some(p), None) => (p, finite_or_zero(round2(p * carat))),
        (None, Some(t)) if carat > 0.0 => (finite_or_zero(round2(t / carat)), t),
        (None, Some(t)) => (0.0, t),
        (None, None) => (0.0, 0.0),
    }
}

fn round2(v: f64) -> f64 {
    let r = (v * 100.0).round() / 100.0;
    if r.is_finite() { r } else { v }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}
