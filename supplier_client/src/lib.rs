//! Client for the supplier's diamond inventory feed.
//!
//! - [`providers::InventorySource`]: the fetch seam used by the sync engine.
//! - [`providers::supplier_rest`]: the HTTP implementation, with credentials,
//!   timeouts and response-envelope detection.
//! - [`models::raw_record::RawRecord`]: lossy, alias-aware access to one record.

pub mod errors;
pub mod models;
pub mod providers;
