//! Inventory source abstraction.
//!
//! [`InventorySource`] is the seam between the sync engine and whichever
//! supplier it pulls from. The production implementation is
//! [`supplier_rest::provider::SupplierRestProvider`]; tests substitute in-memory
//! sources.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use supplier_client::errors::FetchError;
//! use supplier_client::models::raw_record::RawRecord;
//! use supplier_client::providers::InventorySource;
//!
//! struct Fixed(Vec<RawRecord>);
//!
//! #[async_trait]
//! impl InventorySource for Fixed {
//!     async fn fetch_inventory(&self) -> Result<Vec<RawRecord>, FetchError> {
//!         Ok(self.0.clone())
//!     }
//! }
//! ```

pub mod supplier_rest;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{errors::FetchError, models::raw_record::RawRecord};

/// Fetches the full inventory snapshot from a supplier.
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Returns every record of the current snapshot, in supplier order.
    ///
    /// # Errors
    ///
    /// Any [`FetchError`] is fatal to the calling sync run. An empty inventory
    /// is reported as [`FetchError::EmptyPayload`], never as `Ok(vec![])`.
    async fn fetch_inventory(&self) -> Result<Vec<RawRecord>, FetchError>;
}

#[async_trait]
impl<T: InventorySource + ?Sized> InventorySource for Arc<T> {
    async fn fetch_inventory(&self) -> Result<Vec<RawRecord>, FetchError> {
        (**self).fetch_inventory().await
    }
}

#[async_trait]
impl<T: InventorySource + ?Sized> InventorySource for Box<T> {
    async fn fetch_inventory(&self) -> Result<Vec<RawRecord>, FetchError> {
        (**self).fetch_inventory().await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct StaticSource;
    struct BrokenSource;

    #[async_trait]
    impl InventorySource for StaticSource {
        async fn fetch_inventory(&self) -> Result<Vec<RawRecord>, FetchError> {
            Ok(vec![RawRecord::from_value(json!({"stock_id": "S1"}))])
        }
    }

    #[async_trait]
    impl InventorySource for BrokenSource {
        async fn fetch_inventory(&self) -> Result<Vec<RawRecord>, FetchError> {
            Err(FetchError::EmptyPayload { detail: None })
        }
    }

    fn pick(name: &str) -> Box<dyn InventorySource> {
        if name == "static" {
            Box::new(StaticSource)
        } else {
            Box::new(BrokenSource)
        }
    }

    #[tokio::test]
    async fn sources_are_object_safe() {
        let ok = pick("static").fetch_inventory().await.unwrap();
        assert_eq!(ok[0].identifier().as_deref(), Some("S1"));

        let shared: Arc<dyn InventorySource> = Arc::from(pick("broken"));
        assert!(matches!(
            shared.fetch_inventory().await,
            Err(FetchError::EmptyPayload { .. })
        ));
    }
}
