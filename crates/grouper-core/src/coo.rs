//! COO format definitions and constructors

use crate::error::{Result, SparseError};
use crate::index::GroupIndex;

/// Unordered `(row, col, value)` triplets. Duplicates are allowed.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Coo<T, I> {
    pub data: Vec<T>,
    pub row: Vec<I>, // length nnz
    pub col: Vec<I>, // length nnz
    pub ncols: usize,
    pub nrows: usize,
}

impl<T, I> Coo<T, I> {
    #[inline]
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.data.len()
    }
    #[inline]
    #[must_use]
    pub const fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    #[inline]
    #[must_use]
    pub const fn from_parts_unchecked(
        nrows: usize,
        ncols: usize,
        row: Vec<I>,
        col: Vec<I>,
        data: Vec<T>,
    ) -> Self {
        Self {
            data,
            row,
            col,
            ncols,
            nrows,
        }
    }
}

impl<T, I: GroupIndex> Coo<T, I> {
    #[inline]
    pub fn from_parts(
        nrows: usize,
        ncols: usize,
        row: Vec<I>,
        col: Vec<I>,
        data: Vec<T>,
        check: bool,
    ) -> Result<Self> {
        if row.len() != data.len() {
            return Err(SparseError::Length {
                what: "row",
                expected: data.len(),
                got: row.len(),
            });
        }
        if col.len() != data.len() {
            return Err(SparseError::Length {
                what: "col",
                expected: data.len(),
                got: col.len(),
            });
        }
        if check {
            check_range(&row, nrows, "row")?;
            check_range(&col, ncols, "column")?;
        }
        Ok(Self::from_parts_unchecked(nrows, ncols, row, col, data))
    }
}

fn check_range<I: GroupIndex>(idx: &[I], bound: usize, axis: &'static str) -> Result<()> {
    match idx
        .iter()
        .position(|i| i.try_to_usize().map_or(true, |v| v >= bound))
    {
        Some(position) => Err(SparseError::IndexOutOfBounds {
            axis,
            position,
            bound,
        }),
        None => Ok(()),
    }
}
