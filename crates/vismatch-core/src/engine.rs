//! Match engine: scoring, aggregation, filtering, and ranking.
//!
//! The engine is stateless per call apart from the read-only
//! [`CatalogIndex`] it is handed; [`MatchEngine::search`] is safe to invoke
//! concurrently against the same index. The baseline algorithm is a full
//! scan over the catalog's image table, O(number of catalog images).

use crate::catalog::{CatalogIndex, ProductRecord};
use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::filter::FilterSpec;
use crate::result::{ImageMatch, MatchResult};
use crate::vector;

/// The matching and ranking engine.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    max_top_k: usize,
}

impl MatchEngine {
    /// Creates an engine with the configured top-K cap.
    #[must_use]
    pub fn new(search: &SearchConfig) -> Self {
        Self {
            max_top_k: search.max_top_k,
        }
    }

    /// Scores the query against every catalog image, aggregates to
    /// per-product results, filters, and ranks.
    ///
    /// Per product the aggregate score is the **maximum** image-level score:
    /// a product matches as well as its single best-matching image, since a
    /// product may have multiple unrelated angles or variants photographed.
    ///
    /// A degenerate (zero-norm) query yields an empty result, not an error;
    /// so do an unsatisfiable price range and a top-K of zero. Survivors are
    /// sorted by descending aggregate score, ties broken by ascending
    /// product id so equal-score output is deterministic.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the query length differs from
    /// the catalog dimension. That means the embedder and the catalog were
    /// built with different models, which is a fatal configuration error,
    /// not a per-query condition.
    pub fn search(
        &self,
        query: &[f32],
        filter: &FilterSpec,
        catalog: &CatalogIndex,
    ) -> Result<Vec<MatchResult>> {
        if catalog.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != catalog.dimension() {
            return Err(Error::DimensionMismatch {
                expected: catalog.dimension(),
                actual: query.len(),
            });
        }

        let filter = filter.clamped(self.max_top_k);
        if filter.top_k == 0 || filter.price_range_is_empty() {
            return Ok(Vec::new());
        }

        let query = match vector::normalize(query) {
            Ok(q) => q,
            Err(Error::DegenerateVector) => {
                tracing::debug!("degenerate query vector, returning empty result");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        // Image-level scores, row-parallel to the catalog's image table.
        // A zero-norm catalog vector is unscorable, not an error.
        let mut image_scores = Vec::with_capacity(catalog.image_count());
        for record in catalog.all() {
            match vector::cosine_similarity(&query, &record.vector) {
                Ok(score) => image_scores.push(Some(score)),
                Err(Error::DegenerateVector) => image_scores.push(None),
                Err(e) => return Err(e),
            }
        }

        let mut ranked: Vec<(&ProductRecord, f32)> = Vec::new();
        for product in catalog.products() {
            let Some(aggregate) = product
                .image_rows
                .iter()
                .filter_map(|&row| image_scores[row])
                .reduce(f32::max)
            else {
                continue;
            };

            if aggregate < filter.threshold {
                continue;
            }

            // Price filters act on the product's price range, not individual
            // images, so a product with one in-range image is not discarded
            // because another image is out of range. Products with no known
            // price pass.
            if let (Some(min), Some(max_price)) = (filter.min_price, product.max_price) {
                if max_price < min {
                    continue;
                }
            }
            if let (Some(max), Some(min_price)) = (filter.max_price, product.min_price) {
                if min_price > max {
                    continue;
                }
            }

            ranked.push((product, aggregate));
        }

        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.id.cmp(&b.0.id))
        });
        ranked.truncate(filter.top_k);

        let results: Vec<MatchResult> = ranked
            .into_iter()
            .map(|(product, aggregate)| {
                let mut images: Vec<ImageMatch> = product
                    .image_rows
                    .iter()
                    .filter_map(|&row| {
                        let record = &catalog.images()[row];
                        image_scores[row].map(|score| ImageMatch {
                            file: record.file.clone(),
                            price: record.price,
                            score,
                        })
                    })
                    .collect();
                images.sort_by(|a, b| {
                    b.score
                        .partial_cmp(&a.score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });

                MatchResult {
                    product_id: product.id.clone(),
                    name: product.name.clone(),
                    category: product.category.clone(),
                    score: aggregate,
                    min_price: product.min_price,
                    max_price: product.max_price,
                    images,
                }
            })
            .collect();

        tracing::debug!(
            candidates = catalog.len(),
            returned = results.len(),
            threshold = filter.threshold,
            "match query completed"
        );

        Ok(results)
    }
}
