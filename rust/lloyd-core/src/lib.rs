// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lloyd Authors

//! Core types shared by the Lloyd k-means crates.

pub mod error;
pub mod utils;

pub use error::{Error, Result};
