//! Diamond catalog synchronization engine.
//!
//! Pulls the supplier's full inventory snapshot, normalizes each record and
//! upserts it into the local SQLite catalog keyed by stock id, while keeping an
//! auditable run log with progress, cooperative cancellation and a
//! single-active-run guarantee.
//!
//! Layout:
//! - [`catalog`]: record transformer and catalog repository.
//! - [`sync_log`]: the run log store.
//! - [`sync`]: orchestrator, run control and the service facade.
//! - [`db`], [`schema`], [`models`]: persistence.
//! - [`config`]: TOML configuration.

pub mod catalog;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod schema;
pub mod sync;
pub mod sync_log;
pub mod tz;
