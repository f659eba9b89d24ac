//! Small helpers shared by the catalog sync crates.

pub mod config;
pub mod env;
