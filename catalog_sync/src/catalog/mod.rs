//! Local diamond catalog.
//!
//! - [`transform`]: turns one supplier [`RawRecord`](supplier_client::models::raw_record::RawRecord)
//!   into a [`CatalogRecord`](crate::models::diamond::CatalogRecord), coercing bad fields
//!   instead of failing.
//! - [`repo`]: idempotent upsert store keyed by stock id.

pub mod repo;
pub mod transform;
