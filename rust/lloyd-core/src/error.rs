// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lloyd Authors

use arrow_schema::ArrowError;
use snafu::{Location, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display(
        "KMeans: invalid number of clusters k({k}) for {num_rows} vectors, k must be in [1, {num_rows}], {location}"
    ))]
    InvalidClusterCount {
        k: usize,
        num_rows: usize,
        location: Location,
    },
    #[snafu(display("Metric type '{name}' is not supported, {location}"))]
    UnsupportedMetric { name: String, location: Location },
    #[snafu(display("KMeans: cluster {cluster} has no assigned vectors, {location}"))]
    EmptyCluster { cluster: usize, location: Location },
    #[snafu(display("KMeans: all distances of row {row} are not finite, {location}"))]
    NonFiniteDistance { row: usize, location: Location },
    #[snafu(display("Invalid user input: {message}, {location}"))]
    InvalidInput { message: String, location: Location },
    #[snafu(display("LloydError(Arrow): {message}, {location}"))]
    Arrow { message: String, location: Location },
    #[snafu(display("LloydError(Execution): {message}, {location}"))]
    Execution { message: String, location: Location },
}

impl Error {
    #[track_caller]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            location: caller_location(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Location of the caller, as a [`snafu::Location`].
#[track_caller]
pub fn caller_location() -> Location {
    let caller = std::panic::Location::caller();
    Location::new(caller.file(), caller.line(), caller.column())
}

impl From<ArrowError> for Error {
    #[track_caller]
    fn from(e: ArrowError) -> Self {
        Self::Arrow {
            message: e.to_string(),
            location: caller_location(),
        }
    }
}

impl From<Error> for ArrowError {
    fn from(value: Error) -> Self {
        Self::ExternalError(Box::new(value))
    }
}
