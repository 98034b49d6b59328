// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lloyd Authors

use std::borrow::Cow;
use std::ops::Range;
use std::slice::ChunksExact;
use std::sync::Arc;

use arrow_array::{cast::AsArray, types::Float32Type, Array, FixedSizeListArray, Float32Array};
use arrow_schema::{DataType, Field};

use crate::{Error, Result};

/// A row-major matrix of `f32`, `num_rows x num_columns`.
///
/// Rows are vectors. The data is either borrowed from an Arrow array or owned.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixView<'a> {
    data: Cow<'a, [f32]>,
    num_columns: usize,
}

fn check_shape(len: usize, num_columns: usize) -> Result<()> {
    if num_columns == 0 {
        return Err(Error::invalid_input("vector dimension must be positive"));
    }
    if len % num_columns != 0 {
        return Err(Error::invalid_input(format!(
            "{len} values can not be split into rows of dimension {num_columns}"
        )));
    }
    Ok(())
}

impl<'a> MatrixView<'a> {
    pub fn new(data: &'a [f32], num_columns: usize) -> Result<Self> {
        check_shape(data.len(), num_columns)?;
        Ok(Self {
            data: Cow::Borrowed(data),
            num_columns,
        })
    }

    pub fn new_owned(data: Vec<f32>, num_columns: usize) -> Result<MatrixView<'static>> {
        check_shape(data.len(), num_columns)?;
        Ok(MatrixView {
            data: Cow::Owned(data),
            num_columns,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.data.len() / self.num_columns
    }

    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat row-major values.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= num_rows()`.
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.num_columns..(i + 1) * self.num_columns]
    }

    pub fn iter(&self) -> ChunksExact<'_, f32> {
        self.data.chunks_exact(self.num_columns)
    }

    /// Borrow the rows in `rows`.
    pub fn slice_rows(&self, rows: Range<usize>) -> MatrixView<'_> {
        MatrixView {
            data: Cow::Borrowed(&self.data[rows.start * self.num_columns..rows.end * self.num_columns]),
            num_columns: self.num_columns,
        }
    }

    /// Stack `self` on top of `other`.
    pub fn vstack(&self, other: &MatrixView<'_>) -> Result<MatrixView<'static>> {
        if self.num_columns != other.num_columns {
            return Err(Error::invalid_input(format!(
                "can not stack matrices of dimension {} and {}",
                self.num_columns, other.num_columns
            )));
        }
        let mut data = Vec::with_capacity(self.data.len() + other.data.len());
        data.extend_from_slice(&self.data);
        data.extend_from_slice(&other.data);
        MatrixView::new_owned(data, self.num_columns)
    }

    /// Copy into a `FixedSizeList<Float32>` array.
    pub fn to_fsl(&self) -> Result<FixedSizeListArray> {
        let field = Arc::new(Field::new("item", DataType::Float32, true));
        let values = Float32Array::from(self.data.to_vec());
        Ok(FixedSizeListArray::try_new(
            field,
            self.num_columns as i32,
            Arc::new(values),
            None,
        )?)
    }
}

impl<'a> TryFrom<&'a FixedSizeListArray> for MatrixView<'a> {
    type Error = Error;

    fn try_from(fsl: &'a FixedSizeListArray) -> Result<Self> {
        if !matches!(fsl.value_type(), DataType::Float32) {
            return Err(Error::invalid_input(format!(
                "vectors must be FixedSizeList of Float32, got: {}",
                fsl.value_type()
            )));
        }
        if fsl.null_count() > 0 {
            return Err(Error::invalid_input(format!(
                "vectors must not contain nulls, got {} null rows",
                fsl.null_count()
            )));
        }
        if fsl.values().null_count() > 0 {
            return Err(Error::invalid_input(format!(
                "vectors must not contain null values, got {} nulls",
                fsl.values().null_count()
            )));
        }
        let dimension = fsl.value_length() as usize;
        let values = fsl.values().as_primitive::<Float32Type>().values();
        Self::new(&values[..fsl.len() * dimension], dimension)
    }
}
