// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lloyd Authors

//! L2 (Euclidean) distance.
//!
//! Distances are *squared*: no square root is taken. The difference of each
//! component is squared directly instead of expanding `|x|^2 + |y|^2 - 2xy`,
//! which cancels badly when `x` and `y` are close.

use std::iter::Sum;

use num_traits::Float;

use super::PairwiseDistance;
use crate::MatrixView;

/// Calculate the L2 distance between two vectors.
pub trait L2 {
    type Output;

    /// Calculate the squared L2 distance between two vectors.
    fn l2(&self, other: &Self) -> Self::Output;
}

/// Calculate the L2 distance between two vectors, using scalar operations.
///
/// Rely on compiler auto-vectorization.
#[inline]
fn l2_scalar<T: Float + Sum>(from: &[T], to: &[T]) -> T {
    from.iter()
        .zip(to.iter())
        .map(|(a, b)| a.sub(*b).powi(2))
        .sum::<T>()
}

impl L2 for [f32] {
    type Output = f32;

    #[inline]
    fn l2(&self, other: &[f32]) -> f32 {
        debug_assert_eq!(self.len(), other.len());
        l2_scalar(self, other)
    }
}

impl L2 for [f64] {
    type Output = f64;

    #[inline]
    fn l2(&self, other: &[f64]) -> f64 {
        debug_assert_eq!(self.len(), other.len());
        l2_scalar(self, other)
    }
}

/// Compute L2 distance between two vectors.
#[inline]
pub fn l2_distance(from: &[f32], to: &[f32]) -> f32 {
    from.l2(to)
}

/// Compute L2 distance between a vector and a batch of vectors.
///
/// Parameters
///
/// - `from`: the vector to compute distance from.
/// - `to`: a list of vectors to compute distance to.
/// - `dimension`: the dimension of the vectors.
pub fn l2_distance_batch<'a>(
    from: &'a [f32],
    to: &'a [f32],
    dimension: usize,
) -> impl Iterator<Item = f32> + 'a {
    assert_eq!(from.len(), dimension);
    assert_eq!(to.len() % dimension, 0);

    to.chunks_exact(dimension).map(move |v| from.l2(v))
}

/// Reference vectors prepared for squared L2 distance.
pub struct L2References<'a> {
    data: &'a [f32],
    dimension: usize,
}

impl<'a> L2References<'a> {
    pub fn new(references: &'a MatrixView<'_>) -> Self {
        Self {
            data: references.data(),
            dimension: references.num_columns(),
        }
    }
}

impl PairwiseDistance for L2References<'_> {
    fn num_references(&self) -> usize {
        self.data.len() / self.dimension
    }

    fn distances_to(&self, query: &[f32], out: &mut [f32]) {
        debug_assert_eq!(out.len(), self.num_references());
        for (o, d) in out
            .iter_mut()
            .zip(l2_distance_batch(query, self.data, self.dimension))
        {
            *o = d;
        }
    }
}
