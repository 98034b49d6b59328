// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lloyd Authors

use std::fmt;
use std::str::FromStr;

use log::warn;
use rand::Rng;
use snafu::location;
use tracing::instrument;

use super::KMeanMembership;
use crate::{Error, MatrixView, Result};

/// What to do with a movable cluster that received no observations,
/// or whose observations carry zero total weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyClusterPolicy {
    /// Keep the centroid of the previous iteration.
    #[default]
    KeepPrevious,
    /// Move the centroid onto a randomly chosen observation.
    Reseed,
    /// Abort training with [`Error::EmptyCluster`].
    Fail,
}

impl fmt::Display for EmptyClusterPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::KeepPrevious => "keep_previous",
                Self::Reseed => "reseed",
                Self::Fail => "fail",
            }
        )
    }
}

impl FromStr for EmptyClusterPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "keep_previous" | "keep" => Ok(Self::KeepPrevious),
            "reseed" => Ok(Self::Reseed),
            "fail" => Ok(Self::Fail),
            _ => Err(Error::invalid_input(format!(
                "unknown empty cluster policy: {s}"
            ))),
        }
    }
}

/// Recomputes movable centroids as the (weighted) mean of their observations.
///
/// Cluster ids below `num_frozen` belong to frozen centroids: their
/// observations are skipped and frozen centroids are never written.
pub struct CentroidUpdater<'a> {
    data: &'a MatrixView<'a>,
    weights: Option<&'a [f32]>,
    num_frozen: usize,
    policy: EmptyClusterPolicy,
}

impl<'a> CentroidUpdater<'a> {
    pub fn new(
        data: &'a MatrixView<'a>,
        weights: Option<&'a [f32]>,
        num_frozen: usize,
        policy: EmptyClusterPolicy,
    ) -> Self {
        Self {
            data,
            weights,
            num_frozen,
            policy,
        }
    }

    /// Write the next movable centroids into `next`, reading `previous`.
    ///
    /// `previous` and `next` are both `k * dimension`. Returns the ids of the
    /// movable clusters that were empty in this round, offset by the number of
    /// frozen centroids.
    #[instrument(level = "debug", skip_all)]
    pub fn update(
        &self,
        membership: &KMeanMembership,
        previous: &[f32],
        next: &mut [f32],
        rng: &mut impl Rng,
    ) -> Result<Vec<usize>> {
        let dimension = self.data.num_columns();
        debug_assert_eq!(previous.len(), next.len());
        debug_assert_eq!(membership.len(), self.data.num_rows());
        let k = previous.len() / dimension;

        let mut sums = vec![0.0_f64; k * dimension];
        let mut total_weights = vec![0.0_f64; k];
        let mut counts = vec![0_usize; k];
        for (idx, cluster_id) in membership.cluster_ids().enumerate() {
            let Some(cluster) = (cluster_id as usize).checked_sub(self.num_frozen) else {
                continue;
            };
            let weight = self.weights.map_or(1.0, |w| w[idx] as f64);
            counts[cluster] += 1;
            total_weights[cluster] += weight;
            let sum = &mut sums[cluster * dimension..(cluster + 1) * dimension];
            for (s, x) in sum.iter_mut().zip(self.data.row(idx)) {
                *s += weight * *x as f64;
            }
        }

        let mut empty = vec![];
        for cluster in 0..k {
            let range = cluster * dimension..(cluster + 1) * dimension;
            let total = total_weights[cluster];
            if total > 0.0 {
                for (n, s) in next[range.clone()].iter_mut().zip(&sums[range]) {
                    *n = (*s / total) as f32;
                }
                continue;
            }

            let cluster_id = self.num_frozen + cluster;
            if counts[cluster] == 0 {
                warn!("KMeans: cluster {} is empty", cluster_id);
            } else {
                warn!(
                    "KMeans: cluster {} has {} vectors but zero total weight",
                    cluster_id, counts[cluster]
                );
            }
            match self.policy {
                EmptyClusterPolicy::KeepPrevious => {
                    next[range.clone()].copy_from_slice(&previous[range]);
                }
                EmptyClusterPolicy::Reseed => {
                    let row = rng.gen_range(0..self.data.num_rows());
                    next[range].copy_from_slice(self.data.row(row));
                }
                EmptyClusterPolicy::Fail => {
                    return Err(Error::EmptyCluster {
                        cluster: cluster_id,
                        location: location!(),
                    });
                }
            }
            empty.push(cluster_id);
        }
        Ok(empty)
    }
}
