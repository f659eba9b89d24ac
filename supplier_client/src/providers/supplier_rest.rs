//! JSON-over-HTTP supplier feed.

pub mod params;
pub mod provider;
pub mod response;
