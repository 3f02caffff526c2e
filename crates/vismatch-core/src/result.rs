//! Match result records returned to callers.
//!
//! Results are explicit structured records with named, typed fields; the
//! engine never passes loosely-typed maps across its boundary.

use serde::{Deserialize, Serialize};

/// A single catalog image scored against the query.
///
/// The `file` reference is preserved byte-for-byte as the catalog provided
/// it; resolving it to a retrievable URL is a transport-layer concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMatch {
    /// Opaque image file reference from the catalog.
    pub file: String,

    /// Per-image price, if the catalog knows one.
    pub price: Option<f64>,

    /// Image-level cosine similarity against the query.
    pub score: f32,
}

/// A matched product with its aggregate score and per-image breakdown.
///
/// Produced fresh per query; owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Product identifier.
    pub product_id: String,

    /// Product display name.
    pub name: String,

    /// Product category.
    pub category: String,

    /// Aggregate score: the best image-level score among this product's
    /// images.
    pub score: f32,

    /// Lowest known price across this product's images.
    pub min_price: Option<f64>,

    /// Highest known price across this product's images.
    pub max_price: Option<f64>,

    /// All scorable images of this product, sorted by descending image
    /// score, so the caller can present the best-matching photo first.
    pub images: Vec<ImageMatch>,
}

impl MatchResult {
    /// Returns the best-scoring image of this product, if any.
    #[must_use]
    pub fn best_image(&self) -> Option<&ImageMatch> {
        self.images.first()
    }
}
