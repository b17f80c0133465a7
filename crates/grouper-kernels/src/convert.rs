//! COO -> CSR/CSC grouping on top of the general-mode group builder
//!
//! Entries are sharded evenly across threads; every thread may hit every
//! row, so each one budgets over the full key range. Raw grouping keeps
//! duplicates and per-group arrival order; the canonical conversions then
//! sort each group and merge duplicates.

use crate::config::ParallelConfig;
use crate::util::even_shard;
use core::cell::RefCell;
use core::ops::AddAssign;
use grouper_core::{Coo, Csc, Csr, Entry, GroupBuilder, GroupIndex};
use rayon::prelude::*;
use thread_local::ThreadLocal;

/// Groups `(keys[p], minors[p], data[p])` by key. Returns `(indptr, minors, data)`.
fn group_by_key<T>(
    keys: &[i64],
    minors: &[i64],
    data: &[T],
    nkeys: usize,
    cfg: &ParallelConfig,
) -> (Vec<i64>, Vec<i64>, Vec<T>)
where
    T: Copy + Default + Send + Sync,
{
    let nnz = data.len();
    let nshard = cfg.shards_for(nnz);

    let mut indptr: Vec<i64> = Vec::new();
    let mut entries: Vec<Entry<T, i64>> = Vec::new();
    let mut builder = GroupBuilder::new(&mut indptr, &mut entries);
    builder.init_budget(nkeys, nshard);
    builder.budget_handles().into_par_iter().for_each(|mut h| {
        for &k in &keys[even_shard(nnz, nshard, h.threadid())] {
            match k.try_to_usize() {
                Some(key) if key < nkeys => h.add_unit_budget(key),
                _ => panic!("key {k} out of range for {nkeys} groups"),
            }
        }
    });
    builder.init_storage();
    builder.push_handles().into_par_iter().for_each(|mut h| {
        for p in even_shard(nnz, nshard, h.threadid()) {
            // SAFETY: the shard is replayed exactly as it was budgeted.
            unsafe { h.push(keys[p].to_usize(), Entry::new(minors[p], data[p])) };
        }
    });
    builder.finish();

    let (indices, values) = entries
        .into_par_iter()
        .map(|e| (e.index, e.value))
        .unzip();
    (indptr, indices, values)
}

/// Group COO entries by row. Column order inside a row is arrival order and
/// duplicates are kept.
///
/// # Panics
///
/// Panics if a row index is negative or not below `nrows`, which
/// `Coo::from_parts` only rules out with `check`.
#[must_use]
pub fn group_coo_rows<T>(a: &Coo<T, i64>, cfg: &ParallelConfig) -> Csr<T, i64>
where
    T: Copy + Default + Send + Sync,
{
    log::trace!("group_coo_rows: {}x{}, nnz={}", a.nrows, a.ncols, a.nnz());
    let (indptr, indices, data) = group_by_key(&a.row, &a.col, &a.data, a.nrows, cfg);
    Csr::from_parts_unchecked(a.nrows, a.ncols, indptr, indices, data)
}

/// Group COO entries by column; see [`group_coo_rows`].
///
/// # Panics
///
/// Panics if a column index is negative or not below `ncols`.
#[must_use]
pub fn group_coo_cols<T>(a: &Coo<T, i64>, cfg: &ParallelConfig) -> Csc<T, i64>
where
    T: Copy + Default + Send + Sync,
{
    log::trace!("group_coo_cols: {}x{}, nnz={}", a.nrows, a.ncols, a.nnz());
    let (indptr, indices, data) = group_by_key(&a.col, &a.row, &a.data, a.ncols, cfg);
    Csc::from_parts_unchecked(a.nrows, a.ncols, indptr, indices, data)
}

/// Split index/value arrays into one mutable pair of slices per group.
fn split_groups<'x, T>(
    indptr: &[i64],
    mut indices: &'x mut [i64],
    mut data: &'x mut [T],
) -> Vec<(&'x mut [i64], &'x mut [T])> {
    let mut groups = Vec::with_capacity(indptr.len().saturating_sub(1));
    for w in indptr.windows(2) {
        let len = w[1].to_usize() - w[0].to_usize();
        let (gi, rest_i) = core::mem::take(&mut indices).split_at_mut(len);
        let (gd, rest_d) = core::mem::take(&mut data).split_at_mut(len);
        indices = rest_i;
        data = rest_d;
        groups.push((gi, gd));
    }
    groups
}

fn sort_groups<T: Copy + Send>(indptr: &[i64], indices: &mut [i64], data: &mut [T]) {
    let scratch: ThreadLocal<RefCell<Vec<(i64, T)>>> = ThreadLocal::new();
    split_groups(indptr, indices, data)
        .into_par_iter()
        .for_each(|(idx, val)| {
            if idx.windows(2).all(|w| w[0] <= w[1]) {
                return;
            }
            let cell = scratch.get_or(|| RefCell::new(Vec::new()));
            let mut pairs = cell.borrow_mut();
            pairs.clear();
            pairs.extend(idx.iter().copied().zip(val.iter().copied()));
            // stable: duplicates keep arrival order
            pairs.sort_by_key(|&(i, _)| i);
            for (k, (i, v)) in pairs.drain(..).enumerate() {
                idx[k] = i;
                val[k] = v;
            }
        });
}

/// Sort column indices (and their values) inside every row.
pub fn sort_indices<T: Copy + Send>(a: &mut Csr<T, i64>) {
    sort_groups(&a.indptr, &mut a.indices, &mut a.data);
}

/// Sort row indices (and their values) inside every column.
pub fn sort_indices_csc<T: Copy + Send>(a: &mut Csc<T, i64>) {
    sort_groups(&a.indptr, &mut a.indices, &mut a.data);
}

fn merge_adjacent<T: Copy + AddAssign>(
    indptr: &[i64],
    indices: &[i64],
    data: &[T],
) -> (Vec<i64>, Vec<i64>, Vec<T>) {
    let mut out_ptr = Vec::with_capacity(indptr.len());
    let mut out_idx: Vec<i64> = Vec::with_capacity(indices.len());
    let mut out_val: Vec<T> = Vec::with_capacity(data.len());
    out_ptr.push(0i64);
    for w in indptr.windows(2) {
        let group_start = out_idx.len();
        for p in w[0].to_usize()..w[1].to_usize() {
            if out_idx.len() > group_start && out_idx.last() == Some(&indices[p]) {
                if let Some(acc) = out_val.last_mut() {
                    *acc += data[p];
                }
            } else {
                out_idx.push(indices[p]);
                out_val.push(data[p]);
            }
        }
        out_ptr.push(i64::from_usize(out_idx.len()));
    }
    (out_ptr, out_idx, out_val)
}

/// Merge equal adjacent column indices inside each row by summing values.
/// Rows are expected to be sorted.
#[must_use]
pub fn sum_duplicates<T: Copy + AddAssign>(a: &Csr<T, i64>) -> Csr<T, i64> {
    let (indptr, indices, data) = merge_adjacent(&a.indptr, &a.indices, &a.data);
    Csr::from_parts_unchecked(a.nrows, a.ncols, indptr, indices, data)
}

#[must_use]
pub fn sum_duplicates_csc<T: Copy + AddAssign>(a: &Csc<T, i64>) -> Csc<T, i64> {
    let (indptr, indices, data) = merge_adjacent(&a.indptr, &a.indices, &a.data);
    Csc::from_parts_unchecked(a.nrows, a.ncols, indptr, indices, data)
}

/// Convert COO -> CSR, summing duplicates and sorting columns within rows.
#[must_use]
pub fn coo_to_csr<T>(a: &Coo<T, i64>, cfg: &ParallelConfig) -> Csr<T, i64>
where
    T: Copy + Default + Send + Sync + AddAssign,
{
    let mut grouped = group_coo_rows(a, cfg);
    sort_indices(&mut grouped);
    sum_duplicates(&grouped)
}

/// Convert COO -> CSC, summing duplicates and sorting rows within columns.
#[must_use]
pub fn coo_to_csc<T>(a: &Coo<T, i64>, cfg: &ParallelConfig) -> Csc<T, i64>
where
    T: Copy + Default + Send + Sync + AddAssign,
{
    let mut grouped = group_coo_cols(a, cfg);
    sort_indices_csc(&mut grouped);
    sum_duplicates_csc(&grouped)
}
