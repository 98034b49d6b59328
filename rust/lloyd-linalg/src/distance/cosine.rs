// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lloyd Authors

//! Cosine distance
//!
//! <https://en.wikipedia.org/wiki/Cosine_similarity>
//!
//! The dissimilarity is `1 - |cos(x, y)|`: the sign of the similarity is
//! dropped, so antipodal vectors (`v` and `-v`) are at distance 0 and cluster
//! assignment under this metric is sign agnostic.
//!
//! Norms are clamped to [`COSINE_NORM_EPSILON`] before dividing. A zero vector
//! therefore has dissimilarity exactly 1 to every vector instead of `NaN`.

use super::norm_l2::norm_l2;
use super::{dot::dot, PairwiseDistance};
use crate::MatrixView;

/// Lower bound applied to vector norms.
pub const COSINE_NORM_EPSILON: f32 = 1e-8;

/// Cosine distance between two vectors, with the L2 norms of both vectors already known.
#[inline]
pub fn cosine_distance_with_norms(x: &[f32], x_norm: f32, y: &[f32], y_norm: f32) -> f32 {
    let xy = dot(x, y);
    let denominator = x_norm.max(COSINE_NORM_EPSILON) * y_norm.max(COSINE_NORM_EPSILON);
    // |cos| can exceed 1 by a rounding error.
    (1.0 - xy.abs() / denominator).clamp(0.0, 1.0)
}

/// Fast cosine function, that assumes that the norm of the first vector is already known.
#[inline]
pub fn cosine_fast(x: &[f32], x_norm: f32, y: &[f32]) -> f32 {
    cosine_distance_with_norms(x, x_norm, y, norm_l2(y))
}

/// Cosine distance function between two vectors.
pub fn cosine_distance(from: &[f32], to: &[f32]) -> f32 {
    cosine_fast(from, norm_l2(from), to)
}

/// Cosine Distance
///
/// Parameters
/// -----------
///
/// - *from*: the vector to compute distance from.
/// - *batch*: the batch of vectors to compute distance to.
/// - *dimension*: the dimension of the vector.
///
/// Returns
/// -------
/// An iterator of pair-wise cosine distance between from vector to each vector in the batch.
pub fn cosine_distance_batch<'a>(
    from: &'a [f32],
    batch: &'a [f32],
    dimension: usize,
) -> impl Iterator<Item = f32> + 'a {
    let x_norm = norm_l2(from);
    batch
        .chunks_exact(dimension)
        .map(move |y| cosine_fast(from, x_norm, y))
}

/// Reference vectors with their norms computed once.
pub struct CosineReferences<'a> {
    data: &'a [f32],
    dimension: usize,
    norms: Vec<f32>,
}

impl<'a> CosineReferences<'a> {
    pub fn new(references: &'a MatrixView<'_>) -> Self {
        Self {
            data: references.data(),
            dimension: references.num_columns(),
            norms: references.iter().map(norm_l2).collect(),
        }
    }
}

impl PairwiseDistance for CosineReferences<'_> {
    fn num_references(&self) -> usize {
        self.norms.len()
    }

    fn distances_to(&self, query: &[f32], out: &mut [f32]) {
        debug_assert_eq!(out.len(), self.num_references());
        let query_norm = norm_l2(query);
        for ((o, reference), &norm) in out
            .iter_mut()
            .zip(self.data.chunks_exact(self.dimension))
            .zip(self.norms.iter())
        {
            *o = cosine_distance_with_norms(query, query_norm, reference, norm);
        }
    }
}
