// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lloyd Authors

use arrow_array::UInt32Array;
use snafu::location;
use tracing::instrument;

use crate::distance::DistanceEngine;
use crate::kernels::argmin_value_float;
use crate::{Error, MatrixView, Result};

/// Nearest-centroid assignment of a set of vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeanMembership {
    /// Cluster id and distance to that cluster's centroid, for each vector.
    pub cluster_id_and_distances: Vec<(u32, f32)>,

    /// Number of centroids the vectors were assigned against.
    num_clusters: usize,
}

impl KMeanMembership {
    pub fn num_clusters(&self) -> usize {
        self.num_clusters
    }

    /// Returns how many data points are here
    pub fn len(&self) -> usize {
        self.cluster_id_and_distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cluster_id_and_distances.is_empty()
    }

    pub fn cluster_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.cluster_id_and_distances.iter().map(|(c, _)| *c)
    }

    pub fn to_array(&self) -> UInt32Array {
        UInt32Array::from_iter_values(self.cluster_ids())
    }

    /// Sum of the distances of every vector to its centroid.
    pub fn inertia(&self) -> f64 {
        self.cluster_id_and_distances
            .iter()
            .map(|(_, d)| *d as f64)
            .sum()
    }

    /// Histogram of the size of each cluster.
    pub fn histogram(&self) -> Vec<usize> {
        let mut hist: Vec<usize> = vec![0; self.num_clusters];
        for cluster_id in self.cluster_ids() {
            hist[cluster_id as usize] += 1;
        }
        hist
    }
}

/// Assign every row of `data` to its nearest row of `centroids`.
///
/// Ties resolve to the lowest centroid index. Fails with
/// [`Error::NonFiniteDistance`] when no distance of a row is comparable
/// (all `NaN`).
#[instrument(level = "debug", skip_all)]
pub fn compute_membership(
    engine: &DistanceEngine,
    data: &MatrixView,
    centroids: &MatrixView,
) -> Result<KMeanMembership> {
    let num_clusters = centroids.num_rows();
    let cluster_id_and_distances = engine.map_batches(data, centroids, |start, block| {
        block
            .chunks_exact(num_clusters)
            .enumerate()
            .map(|(i, dists)| {
                argmin_value_float(dists.iter().copied()).ok_or(Error::NonFiniteDistance {
                    row: start + i,
                    location: location!(),
                })
            })
            .collect()
    })?;
    Ok(KMeanMembership {
        cluster_id_and_distances,
        num_clusters,
    })
}
