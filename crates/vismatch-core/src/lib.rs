//! # Vismatch Core
//!
//! Visual product matching engine written in Rust.
//!
//! Vismatch takes a query image embedding and ranks catalog products by
//! visual similarity. Every catalog image is scored by cosine similarity
//! against the query; per-image scores aggregate into per-product scores,
//! which are then filtered by similarity threshold and price range.
//!
//! ## Pipeline
//!
//! An external embedder turns the query image into a vector; an offline
//! precompute step turns the catalog into artifacts ([`CatalogIndex`] loads
//! them once at startup). The engine itself is a pure, stateless ranking
//! step over that read-only snapshot.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vismatch_core::{FilterSpec, Matcher, MatcherConfig};
//!
//! let config = MatcherConfig::load()?;
//! let matcher = Matcher::open(&config)?;
//!
//! let filter = FilterSpec::new(0.5, 10).with_price_range(None, Some(200.0));
//! let results = matcher.search(&query_vector, &filter)?;
//!
//! for hit in &results {
//!     println!("{} {:.3}", hit.name, hit.score);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)] // Acceptable for f32/f64 conversions
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]

pub mod catalog;
#[cfg(test)]
mod catalog_tests;
pub mod config;
pub mod embedder;
pub mod engine;
pub mod error;
pub mod filter;
pub mod result;
pub mod vector;

pub use catalog::{
    CatalogHandle, CatalogIndex, EmbeddingTable, ImageIndexEntry, ImageRecord, ProductMeta,
    ProductRecord,
};
pub use config::{CatalogConfig, ConfigError, LoggingConfig, MatcherConfig, SearchConfig};
pub use embedder::QueryEmbedder;
pub use engine::MatchEngine;
pub use error::{Error, Result};
pub use filter::{FilterSpec, DEFAULT_TOP_K, MAX_TOP_K};
pub use result::{ImageMatch, MatchResult};

use std::path::PathBuf;
use std::sync::Arc;

/// Matcher instance owning the engine and the current catalog snapshot.
///
/// Queries from any number of threads run against the same snapshot;
/// [`Matcher::reload`] rebuilds the catalog from disk and swaps it in
/// atomically, so in-flight queries keep the old, fully-consistent index.
#[derive(Debug)]
pub struct Matcher {
    engine: MatchEngine,
    catalog: CatalogHandle,
    products_path: PathBuf,
    index_path: PathBuf,
    vectors_path: PathBuf,
}

impl Matcher {
    /// Opens a matcher: validates the configuration and loads the catalog
    /// artifacts from the configured directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the catalog
    /// artifacts are missing or inconsistent. Catalog errors are fatal by
    /// design: the engine refuses to start serving from a
    /// partially-consistent catalog.
    pub fn open(config: &MatcherConfig) -> Result<Self> {
        config.validate()?;

        let data_dir = PathBuf::from(&config.catalog.data_dir);
        let products_path = data_dir.join(&config.catalog.products_file);
        let index_path = data_dir.join(&config.catalog.index_file);
        let vectors_path = data_dir.join(&config.catalog.vectors_file);

        let index = CatalogIndex::load_from_paths(&products_path, &index_path, &vectors_path)?;

        Ok(Self {
            engine: MatchEngine::new(&config.search),
            catalog: CatalogHandle::new(index),
            products_path,
            index_path,
            vectors_path,
        })
    }

    /// Runs a match query against the current catalog snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the query dimension does not match the catalog.
    pub fn search(&self, query: &[f32], filter: &FilterSpec) -> Result<Vec<MatchResult>> {
        self.engine.search(query, filter, &self.catalog.current())
    }

    /// Rebuilds the catalog from disk and atomically swaps it in.
    ///
    /// On failure the previous snapshot stays in place and keeps serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifacts are missing or inconsistent.
    pub fn reload(&self) -> Result<()> {
        let index =
            CatalogIndex::load_from_paths(&self.products_path, &self.index_path, &self.vectors_path)?;
        let previous = self.catalog.swap(index);
        tracing::info!(
            previous_products = previous.len(),
            products = self.catalog.current().len(),
            "catalog reloaded"
        );
        Ok(())
    }

    /// Returns the current catalog snapshot.
    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogIndex> {
        self.catalog.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::BufWriter;
    use tempfile::tempdir;

    fn write_artifacts(dir: &std::path::Path, products: usize) {
        let metas: Vec<ProductMeta> = (0..products)
            .map(|i| ProductMeta {
                id: format!("p{i}"),
                name: format!("Product {i}"),
                category: "shoes".to_string(),
                price_min: None,
                price_max: None,
            })
            .collect();
        let entries: Vec<ImageIndexEntry> = (0..products)
            .map(|i| ImageIndexEntry {
                product_id: format!("p{i}"),
                file: format!("p{i}.jpg"),
                price: Some(100.0),
            })
            .collect();
        let vectors: Vec<Vec<f32>> = (0..products)
            .map(|i| {
                let mut v = vec![0.0f32; 4];
                v[i % 4] = 1.0;
                v
            })
            .collect();

        serde_json::to_writer(
            BufWriter::new(File::create(dir.join("products.json")).unwrap()),
            &metas,
        )
        .unwrap();
        serde_json::to_writer(
            BufWriter::new(File::create(dir.join("image_index.json")).unwrap()),
            &entries,
        )
        .unwrap();
        let table = EmbeddingTable {
            dimension: 4,
            vectors,
        };
        bincode::serialize_into(
            BufWriter::new(File::create(dir.join("image_embeddings.bin")).unwrap()),
            &table,
        )
        .unwrap();
    }

    fn config_for(dir: &std::path::Path) -> MatcherConfig {
        let mut config = MatcherConfig::default();
        config.catalog.data_dir = dir.to_string_lossy().into_owned();
        config
    }

    #[test]
    fn test_matcher_open_and_search() {
        let dir = tempdir().unwrap();
        write_artifacts(dir.path(), 3);

        let matcher = Matcher::open(&config_for(dir.path())).unwrap();
        assert_eq!(matcher.catalog().len(), 3);

        let results = matcher
            .search(&[1.0, 0.0, 0.0, 0.0], &FilterSpec::default())
            .unwrap();
        assert_eq!(results[0].product_id, "p0");
        assert!((results[0].score - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_matcher_open_missing_artifacts() {
        let dir = tempdir().unwrap();
        let err = Matcher::open(&config_for(dir.path())).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_matcher_reload_swaps_snapshot() {
        let dir = tempdir().unwrap();
        write_artifacts(dir.path(), 2);

        let matcher = Matcher::open(&config_for(dir.path())).unwrap();
        let before = matcher.catalog();
        assert_eq!(before.len(), 2);

        write_artifacts(dir.path(), 4);
        matcher.reload().unwrap();

        // The old snapshot is untouched; the handle serves the new one.
        assert_eq!(before.len(), 2);
        assert_eq!(matcher.catalog().len(), 4);
    }

    #[test]
    fn test_matcher_failed_reload_keeps_previous_snapshot() {
        let dir = tempdir().unwrap();
        write_artifacts(dir.path(), 2);

        let matcher = Matcher::open(&config_for(dir.path())).unwrap();
        std::fs::remove_file(dir.path().join("image_index.json")).unwrap();

        assert!(matcher.reload().is_err());
        assert_eq!(matcher.catalog().len(), 2);
    }

    #[test]
    fn test_matcher_rejects_invalid_config() {
        let dir = tempdir().unwrap();
        write_artifacts(dir.path(), 1);

        let mut config = config_for(dir.path());
        config.search.max_top_k = 0;
        assert!(Matcher::open(&config).is_err());
    }
}
