// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lloyd Authors

//! [Apache Arrow](https://docs.rs/arrow/latest/arrow/) native k-means clustering.
//!
//! The entry points are [`kmeans::KMeans::fit`] and [`kmeans::predict`].

pub mod distance;
pub mod kernels;
pub mod kmeans;
pub mod matrix;

#[cfg(test)]
pub(crate) mod test_utils;

pub use lloyd_core::{Error, Result};
pub use matrix::MatrixView;
