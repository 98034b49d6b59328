// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lloyd Authors

//! Batched pairwise dissimilarities.
//!
//! Queries are processed in row batches of `batch_size`. Each batch owns a
//! `batch_size x num_references` block that is handed to the caller and then
//! dropped, which bounds the working memory of a pass over the queries.
//! Batch boundaries never change the values produced.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::{Arc, LazyLock, Mutex};

use arrow_array::{cast::AsArray, types::Float32Type, FixedSizeListArray};
use lloyd_core::utils::cpu::get_num_compute_intensive_cpus;
use rayon::prelude::*;
use snafu::location;

use super::DistanceType;
use crate::{Error, MatrixView, Result};

/// Default number of query rows computed together.
pub const DEFAULT_BATCH_SIZE: usize = 128;

/// Where distance computation executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionTarget {
    /// On the calling thread.
    #[default]
    Local,
    /// On a dedicated rayon pool, one batch per task.
    ///
    /// `None` uses [`get_num_compute_intensive_cpus`].
    Parallel { num_threads: Option<usize> },
}

impl ExecutionTarget {
    pub fn num_threads(&self) -> usize {
        match self {
            Self::Local => 1,
            Self::Parallel {
                num_threads: Some(n),
            } => (*n).max(1),
            Self::Parallel { num_threads: None } => get_num_compute_intensive_cpus(),
        }
    }
}

/// A dense, row-major `num_rows x num_columns` matrix of dissimilarities.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    values: Vec<f32>,
    num_rows: usize,
    num_columns: usize,
}

impl DistanceMatrix {
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    pub fn value(&self, row: usize, column: usize) -> f32 {
        self.values[row * self.num_columns + column]
    }

    pub fn row(&self, row: usize) -> &[f32] {
        &self.values[row * self.num_columns..(row + 1) * self.num_columns]
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f32> {
        self.values
    }
}

/// Computes dissimilarities between query vectors and reference vectors.
#[derive(Debug, Clone)]
pub struct DistanceEngine {
    distance_type: DistanceType,
    batch_size: usize,
    target: ExecutionTarget,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl DistanceEngine {
    /// A local engine with [`DEFAULT_BATCH_SIZE`].
    pub fn new(distance_type: DistanceType) -> Self {
        Self {
            distance_type,
            batch_size: DEFAULT_BATCH_SIZE,
            target: ExecutionTarget::Local,
            pool: None,
        }
    }

    pub fn try_new(
        distance_type: DistanceType,
        batch_size: usize,
        target: ExecutionTarget,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::invalid_input("batch size must be positive"));
        }
        let pool = match target {
            ExecutionTarget::Local => None,
            ExecutionTarget::Parallel { .. } => Some(shared_pool(target.num_threads())?),
        };
        Ok(Self {
            distance_type,
            batch_size,
            target,
            pool,
        })
    }

    pub fn distance_type(&self) -> DistanceType {
        self.distance_type
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn target(&self) -> ExecutionTarget {
        self.target
    }

    fn batches(&self, num_rows: usize) -> Vec<Range<usize>> {
        (0..num_rows)
            .step_by(self.batch_size)
            .map(|start| start..start.saturating_add(self.batch_size).min(num_rows))
            .collect()
    }

    fn check_inputs(&self, queries: &MatrixView, references: &MatrixView) -> Result<()> {
        if queries.num_columns() != references.num_columns() {
            return Err(Error::invalid_input(format!(
                "query dimension {} does not match reference dimension {}",
                queries.num_columns(),
                references.num_columns()
            )));
        }
        if references.is_empty() {
            return Err(Error::invalid_input("reference vectors must not be empty"));
        }
        Ok(())
    }

    /// Compute the distance block of each query batch and map it through `f`.
    ///
    /// `f` receives the index of the first query row in the batch and the
    /// row-major `rows x num_references` block. Outputs are concatenated in
    /// query order.
    pub fn map_batches<T, F>(
        &self,
        queries: &MatrixView,
        references: &MatrixView,
        f: F,
    ) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(usize, &[f32]) -> Result<Vec<T>> + Sync,
    {
        self.check_inputs(queries, references)?;
        let prepared = self.distance_type.prepare(references);
        let num_references = prepared.num_references();

        let run = |rows: Range<usize>| -> Result<Vec<T>> {
            let mut block = vec![0.0_f32; rows.len() * num_references];
            for (idx, out) in rows.clone().zip(block.chunks_exact_mut(num_references)) {
                prepared.distances_to(queries.row(idx), out);
            }
            f(rows.start, &block)
        };

        let ranges = self.batches(queries.num_rows());
        let outputs = match &self.pool {
            None => ranges.into_iter().map(run).collect::<Result<Vec<_>>>()?,
            Some(pool) => {
                pool.install(|| ranges.into_par_iter().map(run).collect::<Result<Vec<_>>>())?
            }
        };
        Ok(outputs.into_iter().flatten().collect())
    }

    /// The full `num_queries x num_references` dissimilarity matrix.
    pub fn pairwise(&self, queries: &MatrixView, references: &MatrixView) -> Result<DistanceMatrix> {
        let values = self.map_batches(queries, references, |_, block| Ok(block.to_vec()))?;
        Ok(DistanceMatrix {
            values,
            num_rows: queries.num_rows(),
            num_columns: references.num_rows(),
        })
    }

    /// Same as [`Self::pairwise`], over Arrow arrays.
    ///
    /// Returns one `FixedSizeList` row of `references.len()` distances per query.
    pub fn pairwise_arrow(
        &self,
        queries: &FixedSizeListArray,
        references: &FixedSizeListArray,
    ) -> Result<FixedSizeListArray> {
        let queries = MatrixView::try_from(queries)?;
        let references = MatrixView::try_from(references)?;
        let dists = self.pairwise(&queries, &references)?;
        let num_columns = dists.num_columns();
        MatrixView::new_owned(dists.into_values(), num_columns)?.to_fsl()
    }
}

/// Worker pools, one per thread count, shared by every parallel engine.
static POOLS: LazyLock<Mutex<HashMap<usize, Arc<rayon::ThreadPool>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn shared_pool(num_threads: usize) -> Result<Arc<rayon::ThreadPool>> {
    let mut pools = POOLS.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(pool) = pools.get(&num_threads) {
        return Ok(pool.clone());
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|idx| format!("lloyd-cpu-{idx}"))
        .build()
        .map_err(|e| Error::Execution {
            message: format!("failed to build thread pool: {e}"),
            location: location!(),
        })?;
    let pool = Arc::new(pool);
    pools.insert(num_threads, pool.clone());
    Ok(pool)
}

/// Flat `f32` values of a `FixedSizeList<Float32>`, e.g. the output of
/// [`DistanceEngine::pairwise_arrow`].
pub fn fsl_values(fsl: &FixedSizeListArray) -> &[f32] {
    fsl.values().as_primitive::<Float32Type>().values()
}
