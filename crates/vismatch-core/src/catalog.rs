//! Catalog index: immutable, loaded-once collection of product metadata and
//! per-image embedding vectors.
//!
//! The index is built by an offline precompute step which emits three
//! artifacts into a catalog directory:
//!
//! - `products.json`: one object per product (id, name, category, optional
//!   explicit price bounds)
//! - `image_index.json`: one entry per image, row-parallel to the vector
//!   table (owning product id, file reference, optional price)
//! - `image_embeddings.bin`: bincode-encoded [`EmbeddingTable`]
//!
//! Loading is all-or-nothing: any row-count or cross-reference inconsistency
//! is a fatal construction error. After construction the index is read-only;
//! reload replaces the whole index via [`CatalogHandle::swap`].

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};

/// Default file name of the product metadata artifact.
pub const PRODUCTS_FILE: &str = "products.json";

/// Default file name of the image index artifact.
pub const IMAGE_INDEX_FILE: &str = "image_index.json";

/// Default file name of the image embedding table artifact.
pub const EMBEDDINGS_FILE: &str = "image_embeddings.bin";

/// One row of the product metadata table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductMeta {
    /// Product identifier.
    pub id: String,

    /// Product display name.
    pub name: String,

    /// Product category.
    #[serde(default)]
    pub category: String,

    /// Explicit minimum price. When absent, derived from image prices.
    #[serde(default, deserialize_with = "de_lenient_price")]
    pub price_min: Option<f64>,

    /// Explicit maximum price. When absent, derived from image prices.
    #[serde(default, deserialize_with = "de_lenient_price")]
    pub price_max: Option<f64>,
}

/// One entry of the image index, row-parallel to the vector table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageIndexEntry {
    /// Identifier of the owning product.
    pub product_id: String,

    /// Opaque image file reference, preserved unmodified for the transport
    /// layer to resolve.
    pub file: String,

    /// Per-image price. Precompute tools emit these as numbers or as
    /// strings with currency symbols and thousands separators; both forms
    /// are accepted.
    #[serde(default, deserialize_with = "de_lenient_price")]
    pub price: Option<f64>,
}

/// The precomputed per-image embedding table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingTable {
    /// Embedding dimension shared by every row.
    pub dimension: usize,

    /// One embedding vector per image, row-parallel to the image index.
    pub vectors: Vec<Vec<f32>>,
}

/// A catalog image with its precomputed embedding.
///
/// Created during offline precompute, never mutated after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Identifier of the owning product.
    pub product_id: String,

    /// Opaque image file reference.
    pub file: String,

    /// Per-image price, if known.
    pub price: Option<f64>,

    /// Precomputed embedding vector.
    pub vector: Vec<f32>,
}

/// A catalog product with its metadata and image rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Product identifier.
    pub id: String,

    /// Product display name.
    pub name: String,

    /// Product category.
    pub category: String,

    /// Lowest known price (explicit or derived from image prices).
    pub min_price: Option<f64>,

    /// Highest known price (explicit or derived from image prices).
    pub max_price: Option<f64>,

    /// Row indices of this product's images in the catalog's flat image
    /// table, in artifact order.
    pub image_rows: Vec<usize>,
}

/// Immutable mapping from product identifier to [`ProductRecord`], plus a
/// flat image table for efficient full scans.
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    products: IndexMap<String, ProductRecord>,
    images: Vec<ImageRecord>,
    dimension: usize,
}

impl CatalogIndex {
    /// Builds an index from already-parsed artifacts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RowCountMismatch`] if the vector table and the image
    /// index disagree in row count, [`Error::DanglingProduct`] if an image
    /// references an unknown product, [`Error::DimensionMismatch`] if a
    /// vector row deviates from the table dimension, and
    /// [`Error::CatalogLoad`] on duplicate product identifiers. All of these
    /// are fatal: the engine must not start with a partially-consistent
    /// catalog.
    pub fn from_artifacts(
        products: Vec<ProductMeta>,
        entries: Vec<ImageIndexEntry>,
        table: EmbeddingTable,
    ) -> Result<Self> {
        if entries.len() != table.vectors.len() {
            return Err(Error::RowCountMismatch {
                vectors: table.vectors.len(),
                entries: entries.len(),
            });
        }

        let mut product_map: IndexMap<String, ProductRecord> =
            IndexMap::with_capacity(products.len());
        for meta in products {
            let record = ProductRecord {
                id: meta.id.clone(),
                name: meta.name,
                category: meta.category,
                min_price: meta.price_min,
                max_price: meta.price_max,
                image_rows: Vec::new(),
            };
            if product_map.insert(meta.id.clone(), record).is_some() {
                return Err(Error::CatalogLoad(format!(
                    "duplicate product id '{}' in metadata table",
                    meta.id
                )));
            }
        }

        let mut images = Vec::with_capacity(entries.len());
        for (row, (entry, vector)) in entries.into_iter().zip(table.vectors).enumerate() {
            if vector.len() != table.dimension {
                return Err(Error::DimensionMismatch {
                    expected: table.dimension,
                    actual: vector.len(),
                });
            }

            let Some(product) = product_map.get_mut(&entry.product_id) else {
                return Err(Error::DanglingProduct {
                    product_id: entry.product_id,
                    file: entry.file,
                });
            };
            product.image_rows.push(row);

            // Negative prices are nonsense from upstream data; treat as unknown.
            let price = entry.price.filter(|p| *p >= 0.0);
            images.push(ImageRecord {
                product_id: entry.product_id,
                file: entry.file,
                price,
                vector,
            });
        }

        // Derive missing price bounds from image prices.
        for product in product_map.values_mut() {
            let mut prices = product
                .image_rows
                .iter()
                .filter_map(|&row| images[row].price);
            if product.min_price.is_none() {
                product.min_price = prices.clone().reduce(f64::min);
            }
            if product.max_price.is_none() {
                product.max_price = prices.reduce(f64::max);
            }

            if product.image_rows.is_empty() {
                tracing::warn!(product_id = %product.id, "product has no images; it can never match");
            }
        }

        tracing::info!(
            products = product_map.len(),
            images = images.len(),
            dimension = table.dimension,
            "catalog index built"
        );

        Ok(Self {
            products: product_map,
            images,
            dimension: table.dimension,
        })
    }

    /// Loads an index from a catalog directory using the default artifact
    /// file names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CatalogLoad`] if an artifact is missing or
    /// malformed, plus the construction errors of [`Self::from_artifacts`].
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        Self::load_from_paths(
            dir.join(PRODUCTS_FILE),
            dir.join(IMAGE_INDEX_FILE),
            dir.join(EMBEDDINGS_FILE),
        )
    }

    /// Loads an index from explicit artifact paths.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::load_from_dir`].
    pub fn load_from_paths<P: AsRef<Path>>(
        products_path: P,
        index_path: P,
        vectors_path: P,
    ) -> Result<Self> {
        let products: Vec<ProductMeta> = read_json(products_path.as_ref())?;
        let entries: Vec<ImageIndexEntry> = read_json(index_path.as_ref())?;

        let vectors_path = vectors_path.as_ref();
        let file = File::open(vectors_path).map_err(|e| {
            Error::CatalogLoad(format!("cannot open '{}': {e}", vectors_path.display()))
        })?;
        let table: EmbeddingTable = bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| Error::CatalogLoad(format!("malformed '{}': {e}", vectors_path.display())))?;

        Self::from_artifacts(products, entries, table)
    }

    /// Produces a lazy, restartable scan over all image records.
    pub fn all(&self) -> impl Iterator<Item = &ImageRecord> {
        self.images.iter()
    }

    /// Returns the flat image table.
    #[must_use]
    pub fn images(&self) -> &[ImageRecord] {
        &self.images
    }

    /// Iterates over product records in metadata order.
    pub fn products(&self) -> impl Iterator<Item = &ProductRecord> {
        self.products.values()
    }

    /// Looks up a product by identifier.
    #[must_use]
    pub fn get(&self, product_id: &str) -> Option<&ProductRecord> {
        self.products.get(product_id)
    }

    /// Returns the number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Returns the number of image rows.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Returns the embedding dimension of the catalog.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns true if the catalog holds no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Shared handle to the current catalog snapshot.
///
/// Reload is done by building a fresh [`CatalogIndex`] and atomically
/// swapping it in; in-flight queries keep the old, fully-consistent snapshot
/// and no reader ever observes a partially-rebuilt index.
#[derive(Debug)]
pub struct CatalogHandle {
    inner: ArcSwap<CatalogIndex>,
}

impl CatalogHandle {
    /// Wraps an index in a shared handle.
    #[must_use]
    pub fn new(index: CatalogIndex) -> Self {
        Self {
            inner: ArcSwap::from_pointee(index),
        }
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn current(&self) -> Arc<CatalogIndex> {
        self.inner.load_full()
    }

    /// Atomically replaces the snapshot, returning the previous one.
    pub fn swap(&self, index: CatalogIndex) -> Arc<CatalogIndex> {
        self.inner.swap(Arc::new(index))
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)
        .map_err(|e| Error::CatalogLoad(format!("cannot open '{}': {e}", path.display())))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| Error::CatalogLoad(format!("malformed '{}': {e}", path.display())))
}

/// Accepts prices as JSON numbers, nulls, or strings with currency symbols
/// and thousands separators ("1,299.00", "₹1299"). Unparseable values are
/// treated as absent, never as errors.
fn de_lenient_price<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_price))
}

fn parse_price(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64().filter(|p| p.is_finite()),
        JsonValue::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse::<f64>().ok().filter(|p| p.is_finite())
        }
        _ => None,
    }
}

#[cfg(test)]
mod price_tests {
    use super::parse_price;
    use serde_json::json;

    #[test]
    fn parses_plain_numbers() {
        assert_eq!(parse_price(&json!(150)), Some(150.0));
        assert_eq!(parse_price(&json!(99.5)), Some(99.5));
    }

    #[test]
    fn parses_decorated_strings() {
        assert_eq!(parse_price(&json!("1,299.00")), Some(1299.0));
        assert_eq!(parse_price(&json!("₹1299")), Some(1299.0));
        assert_eq!(parse_price(&json!("  450 ")), Some(450.0));
    }

    #[test]
    fn garbage_is_absent_not_an_error() {
        assert_eq!(parse_price(&json!("None")), None);
        assert_eq!(parse_price(&json!("")), None);
        assert_eq!(parse_price(&json!(null)), None);
        assert_eq!(parse_price(&json!([1, 2])), None);
    }
}
