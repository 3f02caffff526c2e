//! Embedder seam.
//!
//! Turning pixels into a vector is an external collaborator's job (a CLIP
//! model behind an inference runtime, a remote service, whatever). The
//! engine only consumes the resulting query vector; this trait is the
//! boundary it consumes it through.

use crate::error::Result;

/// Converts a raw image into a fixed-length embedding vector.
///
/// Implementations must produce vectors of the dimension the catalog was
/// precomputed with; `dimension()` lets callers verify that up front instead
/// of failing on the first query.
pub trait QueryEmbedder: Send + Sync {
    /// The fixed output dimension of this embedder.
    fn dimension(&self) -> usize;

    /// Encodes raw image bytes into an embedding vector.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Embedding`] if the image cannot be
    /// decoded or encoded.
    fn embed(&self, image: &[u8]) -> Result<Vec<f32>>;
}
