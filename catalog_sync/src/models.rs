//! Diesel models mapping to the database schema.
//!
//! These types mirror the tables defined in the embedded migrations and in
//! [`crate::schema`]:
//! - [`crate::schema::diamond`]: the local catalog, one row per supplier stock id
//! - [`crate::schema::sync_run`]: one row per sync invocation and its state
//!
//! See migrations for constraints and triggers (the single-active-run index and
//! the trigger that freezes terminal runs).

pub mod diamond;
pub mod sync_run;
