// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lloyd Authors

//! Dot product.

use std::iter::Sum;

use num_traits::Float;

/// Naive implementation of dot product.
///
/// Rely on compiler auto-vectorization.
#[inline]
pub fn dot<T: Float + Sum>(from: &[T], to: &[T]) -> T {
    debug_assert_eq!(from.len(), to.len());
    from.iter().zip(to.iter()).map(|(x, y)| x.mul(*y)).sum()
}
