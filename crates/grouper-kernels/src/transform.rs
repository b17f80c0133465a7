//! Transpose and CSR <-> CSC conversion via the group builder
//!
//! Major rows are split into contiguous tiles, one per thread, and regrouped
//! by minor index. Cursors are laid out thread-minor inside each output
//! group and every thread walks its tile in ascending order, so output groups
//! come out sorted without a post-pass.

use crate::config::ParallelConfig;
use crate::util::even_shard;
use grouper_core::{Csc, Csr, Entry, GroupBuilder, GroupIndex};
use rayon::prelude::*;

fn regroup_by_minor<T>(
    nmajor: usize,
    nminor: usize,
    indptr: &[i64],
    indices: &[i64],
    data: &[T],
    cfg: &ParallelConfig,
) -> (Vec<i64>, Vec<i64>, Vec<T>)
where
    T: Copy + Default + Send + Sync,
{
    let nshard = cfg.shards_for(data.len()).min(nmajor.max(1));

    let mut out_ptr: Vec<i64> = Vec::new();
    let mut entries: Vec<Entry<T, i64>> = Vec::new();
    let mut builder = GroupBuilder::new(&mut out_ptr, &mut entries);
    builder.init_budget(nminor, nshard);
    builder.budget_handles().into_par_iter().for_each(|mut h| {
        for i in even_shard(nmajor, nshard, h.threadid()) {
            let s = indptr[i].to_usize();
            let e = indptr[i + 1].to_usize();
            for &j in &indices[s..e] {
                match j.try_to_usize() {
                    Some(key) if key < nminor => h.add_unit_budget(key),
                    _ => panic!("index {j} out of range for {nminor} groups"),
                }
            }
        }
    });
    builder.init_storage();
    builder.push_handles().into_par_iter().for_each(|mut h| {
        for i in even_shard(nmajor, nshard, h.threadid()) {
            let s = indptr[i].to_usize();
            let e = indptr[i + 1].to_usize();
            for p in s..e {
                // SAFETY: same tile, same entries as the budget pass.
                unsafe { h.push(indices[p].to_usize(), Entry::new(i64::from_usize(i), data[p])) };
            }
        }
    });
    builder.finish();

    let (out_indices, out_data) = entries
        .into_par_iter()
        .map(|e| (e.index, e.value))
        .unzip();
    (out_ptr, out_indices, out_data)
}

/// Transpose CSR -> CSR. Row indices come out sorted within each output row.
///
/// # Panics
///
/// Panics on a column index outside `0..ncols`. The same holds for the
/// conversions below, which share this path.
#[must_use]
pub fn transpose<T>(a: &Csr<T, i64>, cfg: &ParallelConfig) -> Csr<T, i64>
where
    T: Copy + Default + Send + Sync,
{
    log::trace!("transpose: {}x{}, nnz={}", a.nrows, a.ncols, a.nnz());
    let (indptr, indices, data) =
        regroup_by_minor(a.nrows, a.ncols, &a.indptr, &a.indices, &a.data, cfg);
    Csr::from_parts_unchecked(a.ncols, a.nrows, indptr, indices, data)
}

/// Convert CSR -> CSC of the same shape.
#[must_use]
pub fn csr_to_csc<T>(a: &Csr<T, i64>, cfg: &ParallelConfig) -> Csc<T, i64>
where
    T: Copy + Default + Send + Sync,
{
    let (indptr, indices, data) =
        regroup_by_minor(a.nrows, a.ncols, &a.indptr, &a.indices, &a.data, cfg);
    Csc::from_parts_unchecked(a.nrows, a.ncols, indptr, indices, data)
}

/// Convert CSC -> CSR of the same shape.
#[must_use]
pub fn csc_to_csr<T>(a: &Csc<T, i64>, cfg: &ParallelConfig) -> Csr<T, i64>
where
    T: Copy + Default + Send + Sync,
{
    let (indptr, indices, data) =
        regroup_by_minor(a.ncols, a.nrows, &a.indptr, &a.indices, &a.data, cfg);
    Csr::from_parts_unchecked(a.nrows, a.ncols, indptr, indices, data)
}
