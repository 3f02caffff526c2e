//! Query filter specification.
//!
//! A [`FilterSpec`] carries the caller-supplied tuning knobs for a match
//! query: minimum similarity threshold, top-K, and optional price bounds.
//! All knobs are user-controlled slider values, so invalid input is clamped
//! or ignored rather than rejected; a tuning parameter should never
//! hard-fail a request.

use serde::{Deserialize, Serialize};

/// Default number of products returned when the caller does not say.
pub const DEFAULT_TOP_K: usize = 6;

/// Absolute ceiling on top-K, bounding response size and scan cost.
///
/// Deployments can configure a lower cap via `SearchConfig::max_top_k`.
pub const MAX_TOP_K: usize = 50;

/// Filter specification for a match query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Minimum aggregate similarity a product must reach, in `[0.0, 1.0]`.
    pub threshold: f32,

    /// Maximum number of products to return. Zero is legal and yields an
    /// empty result.
    pub top_k: usize,

    /// Minimum price bound: products whose highest known price is below this
    /// are discarded.
    pub min_price: Option<f64>,

    /// Maximum price bound: products whose lowest known price is above this
    /// are discarded.
    pub max_price: Option<f64>,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            top_k: DEFAULT_TOP_K,
            min_price: None,
            max_price: None,
        }
    }
}

impl FilterSpec {
    /// Creates a filter with the given threshold and top-K.
    ///
    /// The threshold is clamped into `[0.0, 1.0]` (NaN becomes 0.0) and
    /// top-K is capped at [`MAX_TOP_K`].
    #[must_use]
    pub fn new(threshold: f32, top_k: usize) -> Self {
        let threshold = if threshold.is_nan() {
            0.0
        } else {
            threshold.clamp(0.0, 1.0)
        };
        Self {
            threshold,
            top_k: top_k.min(MAX_TOP_K),
            min_price: None,
            max_price: None,
        }
    }

    /// Sets the price bounds. Negative or non-finite bounds are treated as
    /// absent.
    #[must_use]
    pub fn with_price_range(mut self, min_price: Option<f64>, max_price: Option<f64>) -> Self {
        self.min_price = min_price.filter(|p| p.is_finite() && *p >= 0.0);
        self.max_price = max_price.filter(|p| p.is_finite() && *p >= 0.0);
        self
    }

    /// Returns a copy with top-K capped at `max_top_k`.
    ///
    /// Applied by the engine with its configured cap before scanning.
    #[must_use]
    pub fn clamped(&self, max_top_k: usize) -> Self {
        Self {
            top_k: self.top_k.min(max_top_k),
            ..self.clone()
        }
    }

    /// Returns true if the price bounds can never be satisfied (min > max).
    ///
    /// The engine returns an empty result for such filters instead of
    /// erroring.
    #[must_use]
    pub fn price_range_is_empty(&self) -> bool {
        matches!((self.min_price, self.max_price), (Some(min), Some(max)) if min > max)
    }
}
