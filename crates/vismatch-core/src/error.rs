//! Error types for Vismatch.
//!
//! This module provides a unified error type for all engine operations.
//! Construction-time catalog errors are fatal (the engine must not serve
//! from a partially-consistent catalog); query-time errors are not.

use thiserror::Error;

/// Result type alias for Vismatch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Vismatch operations.
///
/// Each variant includes a descriptive error message suitable for end-users.
/// Error codes follow the pattern `VISM-XXX` for easy debugging.
#[derive(Error, Debug)]
pub enum Error {
    /// Dimension mismatch (VISM-001).
    #[error("[VISM-001] Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Degenerate vector (VISM-002).
    ///
    /// A zero-norm vector cannot be normalized; no similarity is computable
    /// against it.
    #[error("[VISM-002] Degenerate vector: zero norm, no similarity computable")]
    DegenerateVector,

    /// Catalog row count mismatch (VISM-003).
    ///
    /// The vector table and the image index must be row-parallel.
    #[error("[VISM-003] Catalog row count mismatch: {vectors} vectors vs {entries} index entries")]
    RowCountMismatch {
        /// Number of rows in the vector table.
        vectors: usize,
        /// Number of entries in the image index.
        entries: usize,
    },

    /// Dangling product reference (VISM-004).
    #[error("[VISM-004] Image '{file}' references unknown product '{product_id}'")]
    DanglingProduct {
        /// Product identifier that failed to resolve.
        product_id: String,
        /// File reference of the offending image row.
        file: String,
    },

    /// Catalog artifact error (VISM-005).
    ///
    /// A catalog artifact is missing, unreadable, or malformed.
    #[error("[VISM-005] Catalog load error: {0}")]
    CatalogLoad(String),

    /// Configuration error (VISM-006).
    #[error("[VISM-006] Configuration error: {0}")]
    Config(String),

    /// Embedding error (VISM-007).
    ///
    /// Raised by `QueryEmbedder` implementations when an image cannot be
    /// turned into a query vector.
    #[error("[VISM-007] Embedding error: {0}")]
    Embedding(String),

    /// IO error (VISM-008).
    #[error("[VISM-008] IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the error code (e.g., "VISM-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DimensionMismatch { .. } => "VISM-001",
            Self::DegenerateVector => "VISM-002",
            Self::RowCountMismatch { .. } => "VISM-003",
            Self::DanglingProduct { .. } => "VISM-004",
            Self::CatalogLoad(_) => "VISM-005",
            Self::Config(_) => "VISM-006",
            Self::Embedding(_) => "VISM-007",
            Self::Io(_) => "VISM-008",
        }
    }

    /// Returns true if this error is fatal.
    ///
    /// Fatal errors mean the catalog is inconsistent or the embedder and
    /// catalog disagree on dimensions; the engine must not serve. They are
    /// surfaced to the operator, not retried.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::RowCountMismatch { .. }
                | Self::DanglingProduct { .. }
                | Self::CatalogLoad(_)
                | Self::DimensionMismatch { .. }
                | Self::Io(_)
        )
    }
}
