// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lloyd Authors

//! Distance metrics
//!
//! This module provides the dissimilarity functions used by k-means and the
//! batched [`DistanceEngine`] that evaluates them between two sets of vectors.

use std::str::FromStr;

use snafu::location;

pub mod cosine;
pub mod dot;
pub mod l2;
pub mod norm_l2;
pub mod pairwise;

pub use cosine::*;
pub use dot::*;
pub use l2::*;
pub use norm_l2::*;
pub use pairwise::{fsl_values, DistanceEngine, DistanceMatrix, ExecutionTarget, DEFAULT_BATCH_SIZE};

use crate::{Error, MatrixView, Result};

/// Distance metrics type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum DistanceType {
    /// Squared Euclidean distance.
    #[default]
    L2,
    /// `1 - |cosine similarity|`. Sign agnostic: `v` and `-v` are at distance 0.
    Cosine,
}

pub type DistanceFunc = fn(&[f32], &[f32]) -> f32;

/// Dissimilarity between one query vector and a fixed set of reference vectors.
///
/// Implementations may precompute per-reference state (e.g. norms) once, and
/// are shared across threads while a batch of queries is evaluated.
pub trait PairwiseDistance: Sync {
    /// Number of reference vectors.
    fn num_references(&self) -> usize;

    /// Write the dissimilarity between `query` and reference `j` into `out[j]`.
    ///
    /// `out.len()` must equal [`Self::num_references`].
    fn distances_to(&self, query: &[f32], out: &mut [f32]);
}

impl DistanceType {
    /// Returns the distance function between two vectors.
    pub fn func(&self) -> DistanceFunc {
        match self {
            Self::L2 => l2_distance,
            Self::Cosine => cosine_distance,
        }
    }

    /// Prepare `references` for repeated evaluation against many queries.
    pub fn prepare<'a>(&self, references: &'a MatrixView<'_>) -> Box<dyn PairwiseDistance + 'a> {
        match self {
            Self::L2 => Box::new(L2References::new(references)),
            Self::Cosine => Box::new(CosineReferences::new(references)),
        }
    }
}

impl std::fmt::Display for DistanceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::L2 => "l2",
                Self::Cosine => "cosine",
            }
        )
    }
}

impl TryFrom<&str> for DistanceType {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "l2" | "euclidean" => Ok(Self::L2),
            "cosine" => Ok(Self::Cosine),
            _ => Err(Error::UnsupportedMetric {
                name: s.to_string(),
                location: location!(),
            }),
        }
    }
}

impl FromStr for DistanceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::try_from(s)
    }
}
