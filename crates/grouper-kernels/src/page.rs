//! Row pages that grow batch by batch.
//!
//! A [`CsrPage`] keeps a row offset array and a flat array of
//! [`Entry`] values. Each pushed batch is appended after the existing rows by
//! running a group builder with `base_row_offset = nrows()`, so earlier rows
//! are never touched or copied.
//!
//! Dense batches use the row-major builder: rows are statically split across
//! threads with [`row_major_partition`] and every thread only keeps counters
//! for its own rows. COO batches may hit any row from any thread and use the
//! general builder.

use crate::config::ParallelConfig;
use crate::util::even_shard;
use grouper_core::{
    row_major_partition, Coo, Csr, Entry, GroupBuilder, GroupIndex, Result, RowMajorGroupBuilder,
    SparseError,
};
use rayon::prelude::*;

/// Row-major dense values borrowed from the caller.
#[derive(Debug, Clone, Copy)]
pub struct DenseBatch<'a> {
    values: &'a [f64],
    nrows: usize,
    ncols: usize,
}

impl<'a> DenseBatch<'a> {
    pub fn new(values: &'a [f64], nrows: usize, ncols: usize) -> Result<Self> {
        let expected = nrows
            .checked_mul(ncols)
            .ok_or(SparseError::Overflow("dense batch shape"))?;
        if values.len() != expected {
            return Err(SparseError::Length {
                what: "dense batch values",
                expected,
                got: values.len(),
            });
        }
        Ok(Self {
            values,
            nrows,
            ncols,
        })
    }

    #[inline]
    #[must_use]
    pub const fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    #[must_use]
    pub const fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    #[must_use]
    pub fn row(&self, i: usize) -> &'a [f64] {
        &self.values[i * self.ncols..(i + 1) * self.ncols]
    }
}

/// NaN is always missing; `missing` marks an extra sentinel.
#[inline]
fn is_present(v: f64, missing: f64) -> bool {
    !v.is_nan() && v != missing
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsrPage {
    ncols: usize,
    offset: Vec<i64>,
    entries: Vec<Entry<f64, i64>>,
}

impl Default for CsrPage {
    fn default() -> Self {
        Self::new()
    }
}

impl CsrPage {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ncols: 0,
            offset: vec![0],
            entries: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn nrows(&self) -> usize {
        self.offset.len() - 1
    }

    #[inline]
    #[must_use]
    pub const fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn offsets(&self) -> &[i64] {
        &self.offset
    }

    #[inline]
    #[must_use]
    pub fn row(&self, i: usize) -> &[Entry<f64, i64>] {
        &self.entries[self.offset[i].to_usize()..self.offset[i + 1].to_usize()]
    }

    /// Append every row of `batch`, skipping missing values. Returns the
    /// number of rows appended.
    pub fn push_dense(&mut self, batch: &DenseBatch<'_>, missing: f64, cfg: &ParallelConfig) -> usize {
        let base = self.nrows();
        let nrows = batch.nrows();
        let nshard = cfg
            .shards_for(nrows * batch.ncols())
            .min(nrows.max(1));

        let mut builder =
            RowMajorGroupBuilder::with_base_row_offset(&mut self.offset, &mut self.entries, base);
        builder.init_budget(nrows, nshard);
        builder.budget_handles().into_par_iter().for_each(|mut h| {
            for r in row_major_partition(nrows, nshard, h.threadid()) {
                let n = batch
                    .row(r)
                    .iter()
                    .filter(|&&v| is_present(v, missing))
                    .count();
                h.add_budget(base + r, i64::from_usize(n));
            }
        });
        builder.init_storage();
        builder.push_handles().into_par_iter().for_each(|mut h| {
            for r in row_major_partition(nrows, nshard, h.threadid()) {
                for (c, &v) in batch.row(r).iter().enumerate() {
                    if is_present(v, missing) {
                        // SAFETY: row r belongs to this thread and was budgeted
                        // with exactly its present values.
                        unsafe { h.push(base + r, Entry::new(i64::from_usize(c), v)) };
                    }
                }
            }
        });
        builder.finish();

        self.ncols = self.ncols.max(batch.ncols());
        log::debug!(
            "page: appended {} dense rows from base {}, nnz now {}",
            nrows,
            base,
            self.nnz()
        );
        nrows
    }

    /// Append the rows of `batch`; its row indices are relative to the
    /// batch. Returns the number of rows appended.
    ///
    /// # Panics
    ///
    /// Panics if a row index of `batch` is negative or not below its `nrows`.
    /// The page is left unchanged in that case.
    pub fn push_coo(&mut self, batch: &Coo<f64, i64>, cfg: &ParallelConfig) -> usize {
        let base = self.nrows();
        let nnz = batch.nnz();
        let nshard = cfg.shards_for(nnz);

        let mut builder =
            GroupBuilder::with_base_row_offset(&mut self.offset, &mut self.entries, base);
        builder.init_budget(base + batch.nrows, nshard);
        builder.budget_handles().into_par_iter().for_each(|mut h| {
            for &r in &batch.row[even_shard(nnz, nshard, h.threadid())] {
                match r.try_to_usize() {
                    Some(row) if row < batch.nrows => h.add_unit_budget(base + row),
                    _ => panic!("batch row {r} out of range for {} rows", batch.nrows),
                }
            }
        });
        builder.init_storage();
        builder.push_handles().into_par_iter().for_each(|mut h| {
            for p in even_shard(nnz, nshard, h.threadid()) {
                let entry = Entry::new(batch.col[p], batch.data[p]);
                // SAFETY: the shard is replayed exactly as it was budgeted.
                unsafe { h.push(base + batch.row[p].to_usize(), entry) };
            }
        });
        builder.finish();

        self.ncols = self.ncols.max(batch.ncols);
        log::debug!(
            "page: appended {} coo rows from base {}, nnz now {}",
            batch.nrows,
            base,
            self.nnz()
        );
        batch.nrows
    }

    /// Split the page into a CSR matrix. Columns keep their pushed order.
    #[must_use]
    pub fn into_csr(self) -> Csr<f64, i64> {
        let nrows = self.nrows();
        let (indices, data) = self
            .entries
            .into_par_iter()
            .map(|e| (e.index, e.value))
            .unzip();
        Csr::from_parts_unchecked(nrows, self.ncols, self.offset, indices, data)
    }
}
