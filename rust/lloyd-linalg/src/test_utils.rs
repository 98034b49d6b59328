// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lloyd Authors

use std::ops::Range;

use proptest::prelude::*;

/// Finite floats that keep squared distances well inside `f32` range.
pub fn arbitrary_f32() -> impl Strategy<Value = f32> {
    -1000.0_f32..1000.0_f32
}

/// Two vectors of the same dimension, drawn from `dimension`.
pub fn arbitrary_vector_pair(
    dimension: Range<usize>,
) -> impl Strategy<Value = (Vec<f32>, Vec<f32>)> {
    dimension.prop_flat_map(|dim| {
        (
            prop::collection::vec(arbitrary_f32(), dim),
            prop::collection::vec(arbitrary_f32(), dim),
        )
    })
}

/// `(dimension, queries, references)` as flat row-major values.
pub fn arbitrary_matrices(
    num_queries: Range<usize>,
    num_references: Range<usize>,
    dimension: Range<usize>,
) -> impl Strategy<Value = (usize, Vec<f32>, Vec<f32>)> {
    (num_queries, num_references, dimension).prop_flat_map(|(n, m, dim)| {
        (
            Just(dim),
            prop::collection::vec(arbitrary_f32(), n * dim),
            prop::collection::vec(arbitrary_f32(), m * dim),
        )
    })
}
