//! CSC format definitions and constructors

use crate::compressed::{check_groups, check_shape, CSC_AXES};
use crate::error::Result;
use crate::index::GroupIndex;

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Csc<T, I> {
    pub data: Vec<T>,
    pub indices: Vec<I>, // row indices per column
    pub indptr: Vec<I>,  // column pointer, length ncols + 1
    pub ncols: usize,
    pub nrows: usize,
}

impl<T, I> Csc<T, I> {
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
        indptr: Vec<I>,
        indices: Vec<I>,
        data: Vec<T>,
    ) -> Self {
        Self {
            data,
            indices,
            indptr,
            ncols,
            nrows,
        }
    }
}

impl<T, I: GroupIndex> Csc<T, I> {
    #[inline]
    pub fn from_parts(
        nrows: usize,
        ncols: usize,
        indptr: Vec<I>,
        indices: Vec<I>,
        data: Vec<T>,
        check: bool,
    ) -> Result<Self> {
        check_shape(ncols, &indptr, indices.len(), data.len(), &CSC_AXES)?;
        if check {
            check_groups(nrows, &indptr, &indices, true, &CSC_AXES)?;
        }
        Ok(Self::from_parts_unchecked(nrows, ncols, indptr, indices, data))
    }

    pub fn validate(&self, require_sorted: bool) -> Result<()> {
        check_shape(self.ncols, &self.indptr, self.indices.len(), self.data.len(), &CSC_AXES)?;
        check_groups(self.nrows, &self.indptr, &self.indices, require_sorted, &CSC_AXES)
    }

    /// Row indices and values of column `j`.
    #[inline]
    #[must_use]
    pub fn col(&self, j: usize) -> (&[I], &[T]) {
        let s = self.indptr[j].to_usize();
        let e = self.indptr[j + 1].to_usize();
        (&self.indices[s..e], &self.data[s..e])
    }
}
