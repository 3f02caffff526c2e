//! Vector math for similarity scoring.
//!
//! SIMD-accelerated kernels using the `wide` crate (8-wide f32 lanes),
//! with a scalar remainder loop. `wide` selects the optimal instruction set
//! per platform (AVX2/SSE on `x86_64`, NEON on `aarch64`), so no runtime
//! dispatch is needed here.

use crate::error::{Error, Result};
use wide::f32x8;

/// Norms below this are treated as zero (no direction, nothing to compare).
const NORM_EPSILON: f32 = 1e-12;

/// Computes the dot product of two equal-length vectors.
///
/// Processes 8 floats per iteration with fused multiply-add, then reduces
/// horizontally and finishes the remainder with a scalar loop.
#[inline]
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let len = a.len();
    let simd_len = len / 8;
    let remainder = len % 8;

    let mut sum = f32x8::ZERO;

    for i in 0..simd_len {
        let offset = i * 8;
        let va = f32x8::from(&a[offset..offset + 8]);
        let vb = f32x8::from(&b[offset..offset + 8]);
        sum = va.mul_add(vb, sum);
    }

    let mut result = sum.reduce_add();

    let base = simd_len * 8;
    for i in 0..remainder {
        result += a[base + i] * b[base + i];
    }

    result
}

/// Computes the Euclidean (L2) norm of a vector.
#[inline]
#[must_use]
pub fn norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

/// Returns `v` scaled to unit length.
///
/// # Errors
///
/// Returns [`Error::DegenerateVector`] if the norm is zero (or not finite).
/// Callers should treat this as "no similarity computable" rather than a
/// hard failure.
pub fn normalize(v: &[f32]) -> Result<Vec<f32>> {
    let n = norm(v);
    if !n.is_finite() || n <= NORM_EPSILON {
        return Err(Error::DegenerateVector);
    }
    Ok(v.iter().map(|x| x / n).collect())
}

/// Computes cosine similarity between two vectors.
///
/// Single-pass fused computation of `dot(a,b)`, `‖a‖²` and `‖b‖²`, then
/// `dot / (‖a‖ * ‖b‖)`. The result is clamped to `[-1.0, 1.0]` to absorb
/// floating-point drift.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if the vectors differ in length, and
/// [`Error::DegenerateVector`] if either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let len = a.len();
    let simd_len = len / 8;
    let remainder = len % 8;

    let mut dot_sum = f32x8::ZERO;
    let mut norm_a = f32x8::ZERO;
    let mut norm_b = f32x8::ZERO;

    for i in 0..simd_len {
        let offset = i * 8;
        let va = f32x8::from(&a[offset..offset + 8]);
        let vb = f32x8::from(&b[offset..offset + 8]);
        dot_sum = va.mul_add(vb, dot_sum);
        norm_a = va.mul_add(va, norm_a);
        norm_b = vb.mul_add(vb, norm_b);
    }

    let mut dot_total = dot_sum.reduce_add();
    let mut norm_a_total = norm_a.reduce_add();
    let mut norm_b_total = norm_b.reduce_add();

    let base = simd_len * 8;
    for i in 0..remainder {
        dot_total += a[base + i] * b[base + i];
        norm_a_total += a[base + i] * a[base + i];
        norm_b_total += b[base + i] * b[base + i];
    }

    let denom = norm_a_total.sqrt() * norm_b_total.sqrt();
    if !denom.is_finite() || denom <= NORM_EPSILON {
        return Err(Error::DegenerateVector);
    }

    Ok((dot_total / denom).clamp(-1.0, 1.0))
}
