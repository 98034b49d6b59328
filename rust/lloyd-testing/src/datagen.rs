// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lloyd Authors

//! Data generation utilities for unit tests and benchmarks

use std::iter::repeat_with;
use std::sync::Arc;

use arrow_array::{FixedSizeListArray, Float32Array};
use arrow_schema::{DataType, Field};
use rand::distributions::{Distribution, Uniform};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Create a random float32 array where each element is uniformly
/// distributed between [0..1]
pub fn generate_random_array(n: usize) -> Float32Array {
    let mut rng = rand::thread_rng();
    Float32Array::from_iter_values(repeat_with(|| rng.gen::<f32>()).take(n))
}

/// Same as [`generate_random_array`], but reproducible.
pub fn generate_random_array_with_seed(n: usize, seed: u64) -> Float32Array {
    let mut rng = StdRng::seed_from_u64(seed);
    Float32Array::from_iter_values(repeat_with(|| rng.gen::<f32>()).take(n))
}

/// Wrap flat row-major values into a `FixedSizeList<Float32>` of `dimension`.
///
/// # Panics
///
/// Panics if `values.len()` is not a multiple of `dimension`.
pub fn to_fsl(values: Float32Array, dimension: usize) -> FixedSizeListArray {
    let field = Arc::new(Field::new("item", DataType::Float32, true));
    FixedSizeListArray::try_new(field, dimension as i32, Arc::new(values), None)
        .expect("values must be a multiple of dimension")
}

/// Isotropic blobs around the given centers.
///
/// Returns `(data, labels)` where row `i` of `data` was drawn uniformly from
/// the cube of half-width `spread` around `centers[labels[i]]`. Rows are
/// grouped by center.
pub fn generate_blobs(
    centers: &[Vec<f32>],
    points_per_center: usize,
    spread: f32,
    seed: u64,
) -> (FixedSizeListArray, Vec<u32>) {
    assert!(!centers.is_empty());
    let dimension = centers[0].len();
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Uniform::new_inclusive(-spread, spread);

    let mut values = Vec::with_capacity(centers.len() * points_per_center * dimension);
    let mut labels = Vec::with_capacity(centers.len() * points_per_center);
    for (label, center) in centers.iter().enumerate() {
        assert_eq!(center.len(), dimension);
        for _ in 0..points_per_center {
            values.extend(center.iter().map(|c| c + noise.sample(&mut rng)));
            labels.push(label as u32);
        }
    }
    (to_fsl(Float32Array::from(values), dimension), labels)
}
