//! Catalog index over the read-only input tree
//!
//! The input tree holds one subdirectory per product, each containing the
//! candidate images for that product. This module enumerates it with a
//! stable, deterministic ordering so that product indices are reproducible
//! across processes and machines. Nothing here ever writes to the tree.

use crate::error::{Result, SelectError};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

/// Image file extensions recognized by the catalog (lowercase, no dot)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff"];

/// A catalog entry: one product directory with candidate images
#[derive(Debug, Clone)]
pub struct Product {
    /// Product identifier, derived from the directory name
    pub id: String,

    /// Absolute or root-relative path of the product directory
    pub path: PathBuf,
}

/// Reference to a single candidate image inside a product directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub product_id: String,
    pub file_name: String,
}

impl ImageRef {
    /// File extension in lowercase, without the leading dot
    pub fn extension(&self) -> &str {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or("")
    }
}

/// Read-only index of products and their candidate images
#[derive(Debug)]
pub struct CatalogIndex {
    source_root: PathBuf,
    products: Vec<Product>,
}

impl CatalogIndex {
    /// Scan the source tree and build the product index.
    ///
    /// Only directories count as products; stray files at the root (zip
    /// archives and the like) are ignored. Fails if the root itself is
    /// missing or unreadable so session start can abort with a clear
    /// diagnostic instead of presenting an empty catalog.
    pub fn scan(source_root: impl Into<PathBuf>) -> Result<Self> {
        let source_root = source_root.into();

        let entries = fs::read_dir(&source_root)
            .map_err(|e| SelectError::catalog(&source_root, e))?;

        let mut products = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SelectError::catalog(&source_root, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let id = entry.file_name().to_string_lossy().into_owned();
            products.push(Product { id, path });
        }

        // Case-insensitive name sort, with the raw name as tie-breaker,
        // so ordering never depends on OS enumeration order.
        products.sort_by(|a, b| compare_names(&a.id, &b.id));

        tracing::debug!(
            root = %source_root.display(),
            products = products.len(),
            "catalog scan complete"
        );

        Ok(Self {
            source_root,
            products,
        })
    }

    /// Root of the input tree
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// All products, in catalog order
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Number of products in the catalog
    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Look up a product by id
    pub fn product(&self, product_id: &str) -> Result<&Product> {
        self.products
            .iter()
            .find(|p| p.id == product_id)
            .ok_or_else(|| SelectError::NotFound(product_id.to_string()))
    }

    /// Catalog-order index of a product, if present
    pub fn position(&self, product_id: &str) -> Option<usize> {
        self.products.iter().position(|p| p.id == product_id)
    }

    /// List candidate images for a product, in deterministic order.
    ///
    /// Re-reads the directory on every call: the tree is shared and
    /// read-only, so there is nothing to invalidate but also nothing
    /// worth caching for a browsing workload.
    pub fn images(&self, product_id: &str) -> Result<Vec<ImageRef>> {
        let product = self.product(product_id)?;

        let entries = fs::read_dir(&product.path)
            .map_err(|e| SelectError::catalog(&product.path, e))?;

        let mut images = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SelectError::catalog(&product.path, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !has_supported_extension(&file_name) {
                continue;
            }
            images.push(ImageRef {
                product_id: product.id.clone(),
                file_name,
            });
        }

        images.sort_by(|a, b| compare_names(&a.file_name, &b.file_name));

        Ok(images)
    }

    /// Resolve an image reference to its path in the input tree.
    ///
    /// Errors with `NotFound` if the file has vanished since the record
    /// referencing it was written (stale record).
    pub fn image_path(&self, image: &ImageRef) -> Result<PathBuf> {
        let product = self.product(&image.product_id)?;
        let path = product.path.join(&image.file_name);
        if !path.is_file() {
            return Err(SelectError::NotFound(format!(
                "{}/{}",
                image.product_id, image.file_name
            )));
        }
        Ok(path)
    }
}

/// Deterministic name ordering: case-insensitive, raw name breaks ties
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn has_supported_extension(file_name: &str) -> bool {
    match file_name.rsplit_once('.') {
        Some((_, ext)) => SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()),
        None => false,
    }
}
