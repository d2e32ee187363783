//! refselect - multi-annotator reference image selection
//!
//! refselect lets a small team of annotators work through a read-only
//! catalog of per-product images and durably record which images are the
//! "reference" ones, optionally tagged with a color. Coordination between
//! annotators happens entirely through the shared output tree; there is no
//! server and no lock table.
//!
//! # Architecture
//!
//! - **Catalog index**: deterministic, read-only enumeration of products
//!   and candidate images
//! - **Record store**: one atomic `selection.json` per product on shared
//!   storage; the only writer of durable state
//! - **Coordination**: per-product status (untouched / in_progress /
//!   completed) derived purely from the records
//! - **Sessions**: per-annotator cursor with crash-safe resume
//! - **Export**: assembles completed selections into an auditable bundle

pub mod catalog;
pub mod config;
pub mod coordinate;
pub mod error;
pub mod export;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use catalog::CatalogIndex;
pub use coordinate::{Coordinator, ProductStatus};
pub use error::{Result, SelectError};
pub use store::{RecordStore, SelectionRecord};
