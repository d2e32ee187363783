//! Status derivation and advisory work arbitration
//!
//! Per-product status is derived purely from the persisted selection
//! records; there is no lock table and no lease protocol. Two annotators
//! asking for the next workable product at the same time may both get the
//! same answer. That race is part of the contract: no reservation step
//! exists, and the eventual save is last-writer-wins. For a small trusted
//! team this loses far less than a lock server would cost.

use crate::catalog::{CatalogIndex, Product};
use crate::error::Result;
use crate::store::{RecordStore, SelectionRecord};
use chrono::{Duration, Utc};
use std::fmt;

/// Derived status of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductStatus {
    /// No record exists; nobody has saved work for this product
    Untouched,

    /// A record exists with `completed = false`
    InProgress,

    /// A record exists with `completed = true`; terminal
    Completed,
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProductStatus::Untouched => "untouched",
            ProductStatus::InProgress => "in_progress",
            ProductStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Derives product status from records and hands out workable products
pub struct Coordinator<'a> {
    catalog: &'a CatalogIndex,
    store: &'a RecordStore,

    /// Incomplete records older than this count as reclaimable
    /// (`Untouched`). Off by default: no record ever proves a session is
    /// still alive, so age alone is a weak signal.
    freshness_window: Option<Duration>,
}

impl<'a> Coordinator<'a> {
    pub fn new(catalog: &'a CatalogIndex, store: &'a RecordStore) -> Self {
        Self {
            catalog,
            store,
            freshness_window: None,
        }
    }

    /// Treat incomplete records older than `window` as abandoned
    pub fn with_freshness_window(mut self, window: std::time::Duration) -> Self {
        self.freshness_window = Duration::from_std(window).ok();
        self
    }

    /// Status of a single product; usable standalone for jump-to
    /// navigation, independent of the next-workable heuristic.
    ///
    /// Errors with `NotFound` if the product is not in the catalog.
    pub fn status_of(&self, product_id: &str) -> Result<ProductStatus> {
        self.catalog.product(product_id)?;
        let status = match self.store.load(product_id)? {
            Some(record) => self.classify(&record),
            None => ProductStatus::Untouched,
        };
        Ok(status)
    }

    /// First product in catalog order with status `Untouched`, or `None`
    /// when every product is completed or in progress.
    ///
    /// Advisory only: concurrent callers can receive the same product.
    pub fn next_workable(&self) -> Result<Option<(usize, &'a Product)>> {
        for (index, product) in self.catalog.products().iter().enumerate() {
            let status = match self.store.load(&product.id)? {
                Some(record) => self.classify(&record),
                None => ProductStatus::Untouched,
            };
            if status == ProductStatus::Untouched {
                return Ok(Some((index, product)));
            }
        }
        Ok(None)
    }

    /// Status of every product, in catalog order
    pub fn statuses(&self) -> Result<Vec<(ProductStatus, &'a Product)>> {
        let mut out = Vec::with_capacity(self.catalog.len());
        for product in self.catalog.products() {
            let status = match self.store.load(&product.id)? {
                Some(record) => self.classify(&record),
                None => ProductStatus::Untouched,
            };
            out.push((status, product));
        }
        Ok(out)
    }

    fn classify(&self, record: &SelectionRecord) -> ProductStatus {
        if record.completed {
            return ProductStatus::Completed;
        }
        if let Some(window) = self.freshness_window {
            let age = Utc::now().signed_duration_since(record.updated_at);
            if age > window {
                tracing::debug!(
                    product = %record.product_id,
                    annotator = %record.annotator,
                    "incomplete record is stale, treating as untouched"
                );
                return ProductStatus::Untouched;
            }
        }
        ProductStatus::InProgress
    }
}
