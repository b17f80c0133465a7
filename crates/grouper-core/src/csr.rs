//! CSR format definitions and constructors

use crate::compressed::{check_groups, check_shape, CSR_AXES};
use crate::error::Result;
use crate::index::GroupIndex;

#[derive(Debug, Clone, PartialEq)]
pub struct Csr<T, I> {
    pub nrows: usize,
    pub ncols: usize,
    pub indptr: Vec<I>,
    pub indices: Vec<I>,
    pub data: Vec<T>,
}

impl<T, I> Csr<T, I> {
    #[inline]
    #[must_use]
    pub const fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    #[inline]
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.data.len()
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
            nrows,
            ncols,
            indptr,
            indices,
            data,
        }
    }
}

impl<T, I: GroupIndex> Csr<T, I> {
    /// Build from raw parts. Lengths and `indptr` endpoints are always
    /// checked; `check` additionally requires a canonical matrix (monotone
    /// `indptr`, in-range and strictly increasing column indices per row).
    pub fn from_parts(
        nrows: usize,
        ncols: usize,
        indptr: Vec<I>,
        indices: Vec<I>,
        data: Vec<T>,
        check: bool,
    ) -> Result<Self> {
        check_shape(nrows, &indptr, indices.len(), data.len(), &CSR_AXES)?;
        if check {
            check_groups(ncols, &indptr, &indices, true, &CSR_AXES)?;
        }
        Ok(Self::from_parts_unchecked(nrows, ncols, indptr, indices, data))
    }

    /// Full structural check. Grouped-but-unsorted matrices pass with
    /// `require_sorted = false`.
    pub fn validate(&self, require_sorted: bool) -> Result<()> {
        check_shape(self.nrows, &self.indptr, self.indices.len(), self.data.len(), &CSR_AXES)?;
        check_groups(self.ncols, &self.indptr, &self.indices, require_sorted, &CSR_AXES)
    }

    /// Column indices and values of row `i`.
    #[inline]
    #[must_use]
    pub fn row(&self, i: usize) -> (&[I], &[T]) {
        let s = self.indptr[i].to_usize();
        let e = self.indptr[i + 1].to_usize();
        (&self.indices[s..e], &self.data[s..e])
    }
}
