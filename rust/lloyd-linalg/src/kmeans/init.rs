// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lloyd Authors

use rand::Rng;
use snafu::location;

use crate::{Error, MatrixView, Result};

/// Randomly initialize kmeans centroids.
///
/// Picks `k` distinct rows of `data` uniformly at random, without replacement,
/// and returns them as a flat `k * dimension` buffer.
pub fn kmeans_random_init(data: &MatrixView, k: usize, rng: &mut impl Rng) -> Result<Vec<f32>> {
    let num_rows = data.num_rows();
    if k == 0 || k > num_rows {
        return Err(Error::InvalidClusterCount {
            k,
            num_rows,
            location: location!(),
        });
    }
    let chosen = rand::seq::index::sample(rng, num_rows, k);
    let mut centroids = Vec::with_capacity(k * data.num_columns());
    for idx in chosen.iter() {
        centroids.extend_from_slice(data.row(idx));
    }
    Ok(centroids)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn rows(n: usize) -> MatrixView<'static> {
        // Row i is (i, -i).
        MatrixView::new_owned((0..n).flat_map(|i| [i as f32, -(i as f32)]).collect(), 2).unwrap()
    }

    #[test]
    fn test_picks_distinct_rows() {
        let data = rows(50);
        let mut rng = StdRng::seed_from_u64(1);
        let centroids = kmeans_random_init(&data, 10, &mut rng).unwrap();
        assert_eq!(centroids.len(), 20);
        let picked = centroids
            .chunks_exact(2)
            .map(|c| {
                assert_eq!(c[0], -c[1]);
                c[0] as usize
            })
            .collect::<HashSet<_>>();
        assert_eq!(picked.len(), 10);
        assert!(picked.iter().all(|&i| i < 50));
    }

    #[test]
    fn test_k_equals_n_is_a_permutation() {
        let data = rows(6);
        let mut rng = StdRng::seed_from_u64(3);
        let centroids = kmeans_random_init(&data, 6, &mut rng).unwrap();
        let mut picked = centroids.chunks_exact(2).map(|c| c[0] as usize).collect::<Vec<_>>();
        picked.sort();
        assert_eq!(picked, (0..6).collect::<Vec<_>>());
    }

    #[test]
    fn test_seeded_is_deterministic() {
        let data = rows(100);
        let a = kmeans_random_init(&data, 5, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = kmeans_random_init(&data, 5, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_cluster_count() {
        let data = rows(4);
        let mut rng = StdRng::seed_from_u64(0);
        for k in [0, 5, 128] {
            match kmeans_random_init(&data, k, &mut rng) {
                Err(Error::InvalidClusterCount { k: got, num_rows, .. }) => {
                    assert_eq!(got, k);
                    assert_eq!(num_rows, 4);
                }
                other => panic!("expected InvalidClusterCount, got {other:?}"),
            }
        }
    }
}
