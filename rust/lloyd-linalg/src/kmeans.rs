// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lloyd Authors

//! Lloyd's k-means.
//!
//! Centroids are split into an optional *frozen* prefix, supplied by the
//! caller and never moved, followed by `k` *movable* centroids learned from
//! the data. Cluster ids index the concatenation `frozen ++ movable`.

use std::fmt;
use std::sync::Arc;

use arrow_array::{Array, FixedSizeListArray, Float32Array, UInt32Array};
use lloyd_core::utils::progress::{IterationCallback, NoopIterationCallback};
use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};
use snafu::location;
use tracing::instrument;

use crate::distance::{DistanceEngine, DistanceType, ExecutionTarget, DEFAULT_BATCH_SIZE};
use crate::{Error, MatrixView, Result};

mod convergence;
mod init;
mod membership;
mod update;

pub use convergence::{ConvergenceMonitor, ConvergenceStatus};
pub use init::kmeans_random_init;
pub use membership::{compute_membership, KMeanMembership};
pub use update::{CentroidUpdater, EmptyClusterPolicy};

/// KMean Training Parameters
#[derive(Clone)]
pub struct KMeansParams {
    /// Max number of iterations.
    pub max_iters: u32,

    /// Stop the training once the squared sum of centroid displacements
    /// drops below this `tolerance`.
    pub tolerance: f32,

    /// The metric to calculate distance.
    pub distance_type: DistanceType,

    /// Where the distance computation runs.
    pub target: ExecutionTarget,

    /// Number of data rows per distance batch.
    pub batch_size: usize,

    /// What happens to a movable cluster left without observations.
    pub empty_cluster_policy: EmptyClusterPolicy,

    /// Seed of the random generator. Drawn from entropy if `None`.
    pub seed: Option<u64>,

    /// One non-negative weight per training vector.
    pub sample_weights: Option<Arc<Float32Array>>,

    /// Centroids that take part in the assignment but are never updated.
    pub frozen_centroids: Option<Arc<FixedSizeListArray>>,

    /// Called after every iteration.
    pub callback: Option<Arc<dyn IterationCallback>>,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            max_iters: 100,
            tolerance: 1e-4,
            distance_type: DistanceType::L2,
            target: ExecutionTarget::Local,
            batch_size: DEFAULT_BATCH_SIZE,
            empty_cluster_policy: EmptyClusterPolicy::KeepPrevious,
            seed: None,
            sample_weights: None,
            frozen_centroids: None,
            callback: None,
        }
    }
}

impl fmt::Debug for KMeansParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KMeansParams")
            .field("max_iters", &self.max_iters)
            .field("tolerance", &self.tolerance)
            .field("distance_type", &self.distance_type)
            .field("target", &self.target)
            .field("batch_size", &self.batch_size)
            .field("empty_cluster_policy", &self.empty_cluster_policy)
            .field("seed", &self.seed)
            .field(
                "sample_weights",
                &self.sample_weights.as_ref().map(|w| w.len()),
            )
            .field(
                "frozen_centroids",
                &self.frozen_centroids.as_ref().map(|c| c.len()),
            )
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl KMeansParams {
    pub fn with_max_iters(mut self, max_iters: u32) -> Self {
        self.max_iters = max_iters;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_distance_type(mut self, distance_type: DistanceType) -> Self {
        self.distance_type = distance_type;
        self
    }

    pub fn with_target(mut self, target: ExecutionTarget) -> Self {
        self.target = target;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_empty_cluster_policy(mut self, policy: EmptyClusterPolicy) -> Self {
        self.empty_cluster_policy = policy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_sample_weights(mut self, weights: Arc<Float32Array>) -> Self {
        self.sample_weights = Some(weights);
        self
    }

    pub fn with_frozen_centroids(mut self, centroids: Arc<FixedSizeListArray>) -> Self {
        self.frozen_centroids = Some(centroids);
        self
    }

    pub fn with_callback(mut self, callback: Arc<dyn IterationCallback>) -> Self {
        self.callback = Some(callback);
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(Error::invalid_input(format!(
                "KMeans: tolerance must be a positive finite number, got {}",
                self.tolerance
            )));
        }
        if self.max_iters == 0 {
            return Err(Error::invalid_input(
                "KMeans: max_iters must be at least 1",
            ));
        }
        if self.batch_size == 0 {
            return Err(Error::invalid_input("KMeans: batch_size must be positive"));
        }
        Ok(())
    }
}

/// A trained k-means model.
#[derive(Debug, Clone)]
pub struct KMeans {
    /// Centroids for each of the k movable clusters.
    ///
    /// k * dimension.
    pub centroids: Arc<Float32Array>,

    /// Frozen centroids, if any. They own cluster ids `0..num_frozen()`.
    pub frozen_centroids: Option<Arc<Float32Array>>,

    /// Vector dimension.
    pub dimension: usize,

    /// The number of movable clusters.
    pub k: usize,

    pub distance_type: DistanceType,
}

/// Result of [`KMeans::fit`].
#[derive(Debug, Clone)]
pub struct KMeansFit {
    pub kmeans: KMeans,

    /// Assignment of every training vector against the returned centroids.
    pub membership: KMeanMembership,

    /// Number of iterations run.
    pub iterations: u32,

    /// Whether training stopped on tolerance rather than on `max_iters`.
    pub converged: bool,

    /// Center shift of the last iteration.
    pub center_shift: f32,
}

impl KMeansFit {
    /// Cluster id of every training vector.
    pub fn cluster_ids(&self) -> UInt32Array {
        self.membership.to_array()
    }
}

/// `frozen ++ movable`, borrowing `movable` when nothing is frozen.
fn stack_centroids<'a>(
    frozen: Option<&MatrixView<'_>>,
    movable: &'a [f32],
    dimension: usize,
) -> Result<MatrixView<'a>> {
    let movable = MatrixView::new(movable, dimension)?;
    match frozen {
        Some(frozen) => frozen.vstack(&movable),
        None => Ok(movable),
    }
}

fn check_weights(weights: &Float32Array, num_rows: usize) -> Result<&[f32]> {
    if weights.len() != num_rows {
        return Err(Error::invalid_input(format!(
            "KMeans: got {} sample weights for {} vectors",
            weights.len(),
            num_rows
        )));
    }
    if weights.null_count() > 0 {
        return Err(Error::invalid_input(
            "KMeans: sample weights must not contain nulls",
        ));
    }
    let values = &weights.values()[..];
    if let Some((idx, w)) = values
        .iter()
        .enumerate()
        .find(|(_, w)| !(w.is_finite() && **w >= 0.0))
    {
        return Err(Error::invalid_input(format!(
            "KMeans: sample weight {w} at position {idx} is not a finite non-negative number"
        )));
    }
    Ok(values)
}

impl KMeans {
    /// Number of frozen centroids.
    pub fn num_frozen(&self) -> usize {
        self.frozen_centroids
            .as_ref()
            .map_or(0, |c| c.len() / self.dimension)
    }

    /// Total number of clusters, frozen and movable.
    pub fn num_clusters(&self) -> usize {
        self.num_frozen() + self.k
    }

    /// The movable centroids as a `FixedSizeList` array.
    pub fn centroids_fsl(&self) -> Result<FixedSizeListArray> {
        MatrixView::new(self.centroids.values(), self.dimension)?.to_fsl()
    }

    /// Every centroid, frozen first, in cluster id order.
    pub fn all_centroids(&self) -> Result<FixedSizeListArray> {
        self.all_centroids_view()?.to_fsl()
    }

    fn all_centroids_view(&self) -> Result<MatrixView<'_>> {
        let frozen = self
            .frozen_centroids
            .as_ref()
            .map(|c| MatrixView::new(c.values(), self.dimension))
            .transpose()?;
        stack_centroids(frozen.as_ref(), self.centroids.values(), self.dimension)
    }

    /// Train a KMeans model on data with `k` clusters, using L2 distance.
    pub fn new(data: &FixedSizeListArray, k: usize, max_iters: u32) -> Result<Self> {
        let params = KMeansParams::default().with_max_iters(max_iters);
        Ok(Self::fit(data, k, &params)?.kmeans)
    }

    /// Train `k` movable centroids on `data`.
    ///
    /// Every parameter is checked before training starts. Training stops when
    /// the squared center shift is below `params.tolerance`, or after
    /// `params.max_iters` iterations.
    #[instrument(level = "debug", skip_all, fields(k = k, num_rows = data.len()))]
    pub fn fit(data: &FixedSizeListArray, k: usize, params: &KMeansParams) -> Result<KMeansFit> {
        let data = MatrixView::try_from(data)?;
        let dimension = data.num_columns();
        let num_rows = data.num_rows();
        if k == 0 || k > num_rows {
            return Err(Error::InvalidClusterCount {
                k,
                num_rows,
                location: location!(),
            });
        }
        params.validate()?;

        let frozen = params
            .frozen_centroids
            .as_deref()
            .map(MatrixView::try_from)
            .transpose()?;
        if let Some(frozen) = frozen.as_ref() {
            if frozen.num_columns() != dimension {
                return Err(Error::invalid_input(format!(
                    "KMeans: frozen centroids have dimension {}, data has dimension {}",
                    frozen.num_columns(),
                    dimension
                )));
            }
        }
        let num_frozen = frozen.as_ref().map_or(0, |f| f.num_rows());
        let weights = params
            .sample_weights
            .as_deref()
            .map(|w| check_weights(w, num_rows))
            .transpose()?;

        let engine = DistanceEngine::try_new(params.distance_type, params.batch_size, params.target)?;
        let mut rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let callback: Arc<dyn IterationCallback> = match &params.callback {
            Some(callback) => callback.clone(),
            None => Arc::new(NoopIterationCallback::default()),
        };

        info!(
            "KMeans training: {} vectors of dimension {}, k={}, frozen={}, distance={}, max_iters={}",
            num_rows, dimension, k, num_frozen, params.distance_type, params.max_iters
        );

        let mut previous = kmeans_random_init(&data, k, &mut rng)?;
        let mut next = vec![0.0_f32; previous.len()];
        let updater =
            CentroidUpdater::new(&data, weights, num_frozen, params.empty_cluster_policy);
        let mut monitor = ConvergenceMonitor::new(params.tolerance, params.max_iters);
        let converged = loop {
            let centroids = stack_centroids(frozen.as_ref(), &previous, dimension)?;
            let membership = compute_membership(&engine, &data, &centroids)?;
            updater.update(&membership, &previous, &mut next, &mut rng)?;
            let status = monitor.observe(&previous, &next, dimension);
            std::mem::swap(&mut previous, &mut next);

            let iteration = monitor.iteration();
            debug!(
                "KMeans training: iteration {} center_shift={}",
                iteration,
                monitor.last_shift()
            );
            callback.on_iteration(iteration, monitor.squared_shift(), params.tolerance);
            if iteration % 10 == 0 {
                info!(
                    "KMeans training: iteration {} / {}, inertia={}",
                    iteration,
                    params.max_iters,
                    membership.inertia()
                );
            }
            match status {
                ConvergenceStatus::Continue => continue,
                ConvergenceStatus::Converged => {
                    info!(
                        "KMeans training: converged at iteration {} / {}",
                        iteration, params.max_iters
                    );
                    break true;
                }
                ConvergenceStatus::MaxIterations => {
                    info!(
                        "KMeans training: stopped after {} iterations without converging, center_shift={}",
                        iteration,
                        monitor.last_shift()
                    );
                    break false;
                }
            }
        };

        let centroids = stack_centroids(frozen.as_ref(), &previous, dimension)?;
        let membership = compute_membership(&engine, &data, &centroids)?;
        let kmeans = Self {
            centroids: Arc::new(Float32Array::from(previous)),
            frozen_centroids: frozen.map(|f| Arc::new(Float32Array::from(f.data().to_vec()))),
            dimension,
            k,
            distance_type: params.distance_type,
        };
        Ok(KMeansFit {
            kmeans,
            membership,
            iterations: monitor.iteration(),
            converged,
            center_shift: monitor.last_shift(),
        })
    }

    /// Assign each vector of `data` to its nearest centroid, frozen ones included.
    pub fn predict(&self, data: &FixedSizeListArray) -> Result<UInt32Array> {
        self.predict_with_target(data, ExecutionTarget::Local)
    }

    pub fn predict_with_target(
        &self,
        data: &FixedSizeListArray,
        target: ExecutionTarget,
    ) -> Result<UInt32Array> {
        let data = MatrixView::try_from(data)?;
        let centroids = self.all_centroids_view()?;
        let engine = DistanceEngine::try_new(self.distance_type, DEFAULT_BATCH_SIZE, target)?;
        Ok(compute_membership(&engine, &data, &centroids)?.to_array())
    }
}

/// Assign each vector of `data` to its nearest row of `centroids`.
pub fn predict(
    data: &FixedSizeListArray,
    centroids: &FixedSizeListArray,
    distance_type: DistanceType,
    target: ExecutionTarget,
) -> Result<UInt32Array> {
    let data = MatrixView::try_from(data)?;
    let centroids = MatrixView::try_from(centroids)?;
    let engine = DistanceEngine::try_new(distance_type, DEFAULT_BATCH_SIZE, target)?;
    Ok(compute_membership(&engine, &data, &centroids)?.to_array())
}

/// Nearest centroid of every row, over flat row-major buffers.
pub fn compute_partitions(
    centroids: &[f32],
    data: &[f32],
    dimension: usize,
    distance_type: DistanceType,
) -> Result<Vec<u32>> {
    let centroids = MatrixView::new(centroids, dimension)?;
    let data = MatrixView::new(data, dimension)?;
    let membership = compute_membership(&DistanceEngine::new(distance_type), &data, &centroids)?;
    Ok(membership.cluster_ids().collect())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use approx::assert_relative_eq;
    use lloyd_testing::datagen::{generate_blobs, generate_random_array_with_seed, to_fsl};
    use proptest::prelude::*;

    use super::*;
    use crate::kernels::argmin;
    use crate::test_utils::arbitrary_matrices;

    fn fsl(values: Vec<f32>, dimension: usize) -> FixedSizeListArray {
        to_fsl(Float32Array::from(values), dimension)
    }

    fn two_blobs() -> FixedSizeListArray {
        fsl(
            vec![
                0.0, 0.0, 1.0, 0.0, 0.0, 1.0, //
                10.0, 10.0, 11.0, 10.0, 10.0, 11.0,
            ],
            2,
        )
    }

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(u32, f32, f32)>>,
    }

    impl IterationCallback for Recorder {
        fn on_iteration(&self, iteration: u32, center_shift: f32, tolerance: f32) {
            self.calls
                .lock()
                .unwrap()
                .push((iteration, center_shift, tolerance));
        }
    }

    #[test]
    fn test_train_with_small_dataset() {
        let data = fsl(vec![1.0, 2.0, 3.0, 4.0], 2);
        for k in [0, 3, 128] {
            match KMeans::new(&data, k, 5) {
                Err(Error::InvalidClusterCount { k: got, num_rows, .. }) => {
                    assert_eq!(got, k);
                    assert_eq!(num_rows, 2);
                }
                other => panic!("expected InvalidClusterCount, got {other:?}"),
            }
        }
    }

    #[test_log::test]
    fn test_two_well_separated_clusters() {
        let data = two_blobs();
        for seed in 0..20 {
            let params = KMeansParams::default().with_seed(seed);
            let fit = KMeans::fit(&data, 2, &params).unwrap();
            assert!(fit.converged);
            assert!(fit.iterations <= 10, "took {} iterations", fit.iterations);

            let ids = fit.cluster_ids();
            let ids = ids.values();
            assert!(ids[..3].iter().all(|id| *id == ids[0]));
            assert!(ids[3..].iter().all(|id| *id == ids[3]));
            assert_ne!(ids[0], ids[3]);

            let low = fit.kmeans.centroids.values()[ids[0] as usize * 2..][..2].to_vec();
            let high = fit.kmeans.centroids.values()[ids[3] as usize * 2..][..2].to_vec();
            assert_relative_eq!(low[0], 1.0 / 3.0, epsilon = 1e-5);
            assert_relative_eq!(low[1], 1.0 / 3.0, epsilon = 1e-5);
            assert_relative_eq!(high[0], 31.0 / 3.0, epsilon = 1e-5);
            assert_relative_eq!(high[1], 31.0 / 3.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_weighted_mean() {
        let data = fsl(vec![1.0, 0.0, 3.0, 0.0], 2);
        let params = KMeansParams::default()
            .with_seed(7)
            .with_sample_weights(Arc::new(Float32Array::from(vec![1.0, 3.0])));
        let fit = KMeans::fit(&data, 1, &params).unwrap();
        assert_eq!(fit.kmeans.centroids.values().to_vec(), vec![2.5, 0.0]);

        let fit = KMeans::fit(&data, 1, &KMeansParams::default().with_seed(7)).unwrap();
        assert_eq!(fit.kmeans.centroids.values().to_vec(), vec![2.0, 0.0]);
    }

    #[test]
    fn test_frozen_centroids_never_change() {
        let frozen = vec![0.0, 0.0, 100.0, 100.0];
        let (blobs, _) = generate_blobs(
            &[vec![0.0, 0.0], vec![50.0, 0.0], vec![100.0, 100.0]],
            20,
            1.0,
            3,
        );
        // Exact copies of the frozen centroids always land in their clusters.
        let mut values = frozen.clone();
        values.extend_from_slice(crate::distance::fsl_values(&blobs));
        let data = fsl(values, 2);

        for seed in 0..5 {
            let recorder = Arc::new(Recorder::default());
            let params = KMeansParams::default()
                .with_seed(seed)
                .with_frozen_centroids(Arc::new(fsl(frozen.clone(), 2)))
                .with_callback(recorder.clone());
            let fit = KMeans::fit(&data, 2, &params).unwrap();

            assert_eq!(fit.kmeans.num_frozen(), 2);
            assert_eq!(fit.kmeans.num_clusters(), 4);
            let all = fit.kmeans.all_centroids().unwrap();
            assert_eq!(&crate::distance::fsl_values(&all)[..4], frozen.as_slice());
            assert_eq!(
                fit.kmeans.frozen_centroids.as_ref().unwrap().values().to_vec(),
                frozen
            );

            let ids = fit.cluster_ids();
            assert_eq!(ids.value(0), 0);
            assert_eq!(ids.value(1), 1);
            assert!(ids.values().iter().all(|id| *id < 4));
            assert_eq!(
                recorder.calls.lock().unwrap().len(),
                fit.iterations as usize
            );
        }
    }

    #[test]
    fn test_movable_centroid_between_frozen() {
        // Only the middle blob is data; the frozen centroids are far away.
        let (data, _) = generate_blobs(&[vec![50.0, 0.0]], 30, 1.0, 11);
        let frozen = fsl(vec![0.0, 0.0, 100.0, 100.0], 2);
        let params = KMeansParams::default()
            .with_seed(1)
            .with_frozen_centroids(Arc::new(frozen));
        let fit = KMeans::fit(&data, 1, &params).unwrap();
        assert!(fit.converged);
        assert!(fit.cluster_ids().values().iter().all(|id| *id == 2));

        let values = crate::distance::fsl_values(&data);
        let mean_x = values.iter().step_by(2).sum::<f32>() / 30.0;
        let mean_y = values.iter().skip(1).step_by(2).sum::<f32>() / 30.0;
        assert_relative_eq!(fit.kmeans.centroids.value(0), mean_x, epsilon = 1e-4);
        assert_relative_eq!(fit.kmeans.centroids.value(1), mean_y, epsilon = 1e-4);
    }

    #[test]
    fn test_predict_reproduces_membership() {
        let centers = vec![vec![0.0; 8], vec![5.0; 8], vec![-5.0; 8]];
        let (data, _) = generate_blobs(&centers, 50, 2.0, 5);
        for target in [
            ExecutionTarget::Local,
            ExecutionTarget::Parallel { num_threads: Some(3) },
        ] {
            let params = KMeansParams::default()
                .with_seed(9)
                .with_target(target)
                .with_batch_size(17)
                .with_frozen_centroids(Arc::new(fsl(vec![1.0; 8], 8)));
            let fit = KMeans::fit(&data, 3, &params).unwrap();
            assert_eq!(fit.kmeans.predict(&data).unwrap(), fit.cluster_ids());
            assert_eq!(
                fit.kmeans.predict_with_target(&data, target).unwrap(),
                fit.cluster_ids()
            );

            let all = fit.kmeans.all_centroids().unwrap();
            let ids = predict(&data, &all, DistanceType::L2, ExecutionTarget::Local).unwrap();
            assert_eq!(ids, fit.cluster_ids());
        }
    }

    #[test]
    fn test_seeded_fit_is_deterministic() {
        let data = to_fsl(generate_random_array_with_seed(300 * 4, 13), 4);
        let params = KMeansParams::default().with_seed(21);
        let a = KMeans::fit(&data, 6, &params).unwrap();
        let b = KMeans::fit(&data, 6, &params).unwrap();
        assert_eq!(a.kmeans.centroids, b.kmeans.centroids);
        assert_eq!(a.cluster_ids(), b.cluster_ids());
        assert_eq!(a.iterations, b.iterations);
    }

    #[test]
    fn test_max_iters_cap() {
        let data = to_fsl(generate_random_array_with_seed(200 * 2, 17), 2);
        let recorder = Arc::new(Recorder::default());
        let params = KMeansParams::default()
            .with_seed(3)
            .with_max_iters(1)
            .with_tolerance(1e-12)
            .with_callback(recorder.clone());
        let fit = KMeans::fit(&data, 5, &params).unwrap();
        assert_eq!(fit.iterations, 1);
        assert!(!fit.converged);
        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, 1);
        assert_eq!(calls[0].2, 1e-12);
        assert_relative_eq!(calls[0].1, fit.center_shift * fit.center_shift);
    }

    #[test]
    fn test_callback_sees_every_iteration() {
        let recorder = Arc::new(Recorder::default());
        let params = KMeansParams::default()
            .with_seed(4)
            .with_callback(recorder.clone());
        let fit = KMeans::fit(&two_blobs(), 2, &params).unwrap();
        let calls = recorder.calls.lock().unwrap();
        assert_eq!(
            calls.iter().map(|c| c.0).collect::<Vec<_>>(),
            (1..=fit.iterations).collect::<Vec<_>>()
        );
        assert!(calls.iter().all(|c| c.2 == params.tolerance));
        // The last iteration is the one that converged.
        assert!(calls.last().unwrap().1 < params.tolerance);
    }

    #[test]
    fn test_empty_cluster_policies() {
        let data = fsl(vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0], 2);

        for policy in [EmptyClusterPolicy::KeepPrevious, EmptyClusterPolicy::Reseed] {
            let params = KMeansParams::default()
                .with_seed(0)
                .with_empty_cluster_policy(policy);
            let fit = KMeans::fit(&data, 2, &params).unwrap();
            assert!(fit.converged);
            assert_eq!(fit.iterations, 1);
            assert_eq!(fit.kmeans.centroids.values().to_vec(), vec![1.0; 4]);
            assert_eq!(fit.membership.histogram(), vec![4, 0]);
        }

        let params = KMeansParams::default()
            .with_seed(0)
            .with_empty_cluster_policy(EmptyClusterPolicy::Fail);
        match KMeans::fit(&data, 2, &params) {
            Err(Error::EmptyCluster { cluster, .. }) => assert_eq!(cluster, 1),
            other => panic!("expected EmptyCluster, got {other:?}"),
        }

        // Cluster ids of empty clusters count the frozen centroids.
        let params = params.with_frozen_centroids(Arc::new(fsl(vec![5.0, 5.0], 2)));
        match KMeans::fit(&data, 2, &params) {
            Err(Error::EmptyCluster { cluster, .. }) => assert_eq!(cluster, 2),
            other => panic!("expected EmptyCluster, got {other:?}"),
        }
    }

    #[test]
    fn test_cosine_fit() {
        let (data, _) = generate_blobs(&[vec![10.0, 0.0, 0.0], vec![0.0, 10.0, 0.0]], 20, 1.0, 2);
        let params = KMeansParams::default()
            .with_seed(5)
            .with_distance_type(DistanceType::Cosine);
        let fit = KMeans::fit(&data, 2, &params).unwrap();
        assert_eq!(fit.kmeans.distance_type, DistanceType::Cosine);
        assert!(fit.cluster_ids().values().iter().all(|id| *id < 2));
        assert_eq!(fit.kmeans.predict(&data).unwrap(), fit.cluster_ids());

        // Opposite vectors share a cluster.
        let negated = fsl(
            crate::distance::fsl_values(&data).iter().map(|v| -v).collect(),
            3,
        );
        assert_eq!(fit.kmeans.predict(&negated).unwrap(), fit.cluster_ids());
    }

    #[test]
    fn test_invalid_params() {
        let data = two_blobs();
        let invalid = [
            KMeansParams::default().with_tolerance(0.0),
            KMeansParams::default().with_tolerance(-1.0),
            KMeansParams::default().with_tolerance(f32::NAN),
            KMeansParams::default().with_max_iters(0),
            KMeansParams::default().with_batch_size(0),
            KMeansParams::default().with_sample_weights(Arc::new(Float32Array::from(vec![1.0; 5]))),
            KMeansParams::default().with_sample_weights(Arc::new(Float32Array::from(vec![
                1.0, 1.0, -1.0, 1.0, 1.0, 1.0,
            ]))),
            KMeansParams::default().with_sample_weights(Arc::new(Float32Array::from(vec![
                1.0,
                1.0,
                f32::INFINITY,
                1.0,
                1.0,
                1.0,
            ]))),
            KMeansParams::default()
                .with_frozen_centroids(Arc::new(fsl(vec![0.0, 0.0, 0.0], 3))),
        ];
        for params in invalid {
            match KMeans::fit(&data, 2, &params) {
                Err(Error::InvalidInput { .. }) => {}
                other => panic!("expected InvalidInput for {params:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_rejects_non_float_data() {
        let values = arrow_array::Int32Array::from(vec![1, 2, 3, 4]);
        let field = Arc::new(arrow_schema::Field::new(
            "item",
            arrow_schema::DataType::Int32,
            true,
        ));
        let data = FixedSizeListArray::try_new(field, 2, Arc::new(values), None).unwrap();
        assert!(matches!(
            KMeans::fit(&data, 1, &KMeansParams::default()),
            Err(Error::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_rejects_null_values() {
        let data = to_fsl(
            Float32Array::from(vec![Some(1.0), Some(2.0), None, Some(4.0)]),
            2,
        );
        assert!(matches!(
            KMeans::fit(&data, 1, &KMeansParams::default()),
            Err(Error::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_params_debug() {
        let params = KMeansParams::default()
            .with_callback(Arc::new(NoopIterationCallback::default()))
            .with_sample_weights(Arc::new(Float32Array::from(vec![1.0; 3])));
        let debug = format!("{params:?}");
        assert!(debug.contains("max_iters: 100"));
        assert!(debug.contains("sample_weights: Some(3)"));
        assert!(debug.contains("callback: true"));
    }

    #[test]
    fn test_compute_partitions() {
        const DIM: usize = 64;
        let centroids = generate_random_array_with_seed(DIM * 18, 1);
        let data = generate_random_array_with_seed(DIM * 20, 2);

        let expected = data
            .values()
            .chunks(DIM)
            .map(|row| {
                argmin(
                    centroids
                        .values()
                        .chunks(DIM)
                        .map(|centroid| crate::distance::l2_distance(row, centroid)),
                )
                .unwrap()
            })
            .collect::<Vec<_>>();
        let actual =
            compute_partitions(centroids.values(), data.values(), DIM, DistanceType::L2).unwrap();
        assert_eq!(expected, actual);
    }

    proptest::proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_cluster_ids_in_range(
            (dim, data, frozen) in arbitrary_matrices(1..40, 0..4, 1..5),
            k_fraction in 0.0_f64..1.0,
            seed in any::<u64>(),
        ) {
            let num_rows = data.len() / dim;
            let k = 1 + ((num_rows - 1) as f64 * k_fraction) as usize;
            let mut params = KMeansParams::default().with_seed(seed).with_max_iters(20);
            let num_frozen = frozen.len() / dim;
            if num_frozen > 0 {
                params = params.with_frozen_centroids(Arc::new(fsl(frozen, dim)));
            }
            let data = fsl(data, dim);
            let fit = KMeans::fit(&data, k, &params).unwrap();
            prop_assert_eq!(fit.kmeans.num_clusters(), num_frozen + k);
            prop_assert_eq!(fit.kmeans.centroids.len(), k * dim);
            prop_assert!(fit.iterations >= 1 && fit.iterations <= 20);
            prop_assert!(fit.cluster_ids().values().iter().all(|id| (*id as usize) < num_frozen + k));
            prop_assert_eq!(fit.kmeans.predict(&data).unwrap(), fit.cluster_ids());
        }
    }
}
