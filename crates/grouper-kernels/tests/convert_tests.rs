use grouper_core::{Coo, Csr};
use grouper_kernels::*;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Forces several shards even on tiny inputs.
fn sharded(nthread: usize) -> ParallelConfig {
    ParallelConfig::default()
        .with_nthread(nthread)
        .with_small_work_limit(0)
}

fn simple_coo() -> Coo<f64, i64> {
    // A = [[1,0,2],[0,3,0]] in COO, out of order
    let row = vec![1i64, 0, 0];
    let col = vec![1i64, 2, 0];
    let data = vec![3.0f64, 2.0, 1.0];
    Coo::from_parts(2, 3, row, col, data, true).unwrap()
}

#[test]
fn test_coo_to_csr_basic() {
    let csr = coo_to_csr(&simple_coo(), &sharded(2));
    assert_eq!(csr.shape(), (2, 3));
    assert_eq!(csr.indptr, vec![0i64, 2, 3]);
    assert_eq!(csr.indices, vec![0i64, 2, 1]);
    assert!(approx_eq(csr.data[0], 1.0) && approx_eq(csr.data[1], 2.0) && approx_eq(csr.data[2], 3.0));
    assert!(csr.validate(true).is_ok());
}

#[test]
fn test_coo_to_csc_basic() {
    let csc = coo_to_csc(&simple_coo(), &sharded(3));
    assert_eq!(csc.indptr, vec![0i64, 1, 2, 3]);
    assert_eq!(csc.indices, vec![0i64, 1, 0]);
    assert_eq!(csc.data, vec![1.0, 3.0, 2.0]);
    assert!(csc.validate(true).is_ok());
}

#[test]
fn test_group_keeps_duplicates() {
    let row = vec![1i64, 0, 1, 1];
    let col = vec![2i64, 1, 0, 2];
    let data = vec![1.0f64, 2.0, 3.0, 4.0];
    let coo = Coo::from_parts(2, 3, row, col, data, true).unwrap();

    let grouped = group_coo_rows(&coo, &sharded(2));
    assert_eq!(grouped.indptr, vec![0i64, 1, 4]);
    assert_eq!(grouped.nnz(), 4);
    assert!(grouped.validate(false).is_ok());
    let (cols, _) = grouped.row(1);
    let mut cols = cols.to_vec();
    cols.sort_unstable();
    assert_eq!(cols, vec![0, 2, 2]);

    let csr = coo_to_csr(&coo, &sharded(2));
    assert_eq!(csr.indptr, vec![0i64, 1, 3]);
    assert_eq!(csr.indices, vec![1i64, 0, 2]);
    assert!(approx_eq(csr.data[2], 5.0));
}

#[test]
fn test_group_single_shard_keeps_arrival_order() {
    let coo = Coo::from_parts(1, 4, vec![0i64, 0, 0], vec![3i64, 1, 2], vec![1.0f64, 2.0, 3.0], true)
        .unwrap();
    let grouped = group_coo_rows(&coo, &ParallelConfig::serial());
    assert_eq!(grouped.indices, vec![3i64, 1, 2]);
    assert_eq!(grouped.data, vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_empty_rows_and_empty_matrix() {
    let coo = Coo::from_parts(4, 2, vec![3i64], vec![1i64], vec![7.0f64], true).unwrap();
    let csr = coo_to_csr(&coo, &sharded(4));
    assert_eq!(csr.indptr, vec![0i64, 0, 0, 0, 1]);

    let empty: Coo<f64, i64> = Coo::from_parts(3, 3, vec![], vec![], vec![], true).unwrap();
    let csr = coo_to_csr(&empty, &sharded(2));
    assert_eq!(csr.indptr, vec![0i64; 4]);
    assert!(csr.indices.is_empty() && csr.data.is_empty());
}

#[test]
fn test_sort_and_sum_in_place() {
    let mut a = Csr::from_parts(2, 4, vec![0i64, 3, 5], vec![3i64, 0, 3, 2, 1], vec![1.0f64, 2.0, 3.0, 4.0, 5.0], false)
        .unwrap();
    sort_indices(&mut a);
    assert_eq!(a.indices, vec![0i64, 3, 3, 1, 2]);
    assert_eq!(a.data, vec![2.0, 1.0, 3.0, 5.0, 4.0]);
    let s = sum_duplicates(&a);
    assert_eq!(s.indptr, vec![0i64, 2, 4]);
    assert_eq!(s.indices, vec![0i64, 3, 1, 2]);
    assert_eq!(s.data, vec![2.0, 4.0, 5.0, 4.0]);
    assert!(s.validate(true).is_ok());
}

#[test]
fn test_integer_values() {
    let coo = Coo::from_parts(3, 3, vec![2i64, 0, 2, 1], vec![0i64, 0, 0, 2], vec![1u32, 2, 3, 4], true)
        .unwrap();
    let csr = coo_to_csr(&coo, &sharded(3));
    assert_eq!(csr.indptr, vec![0i64, 1, 2, 3]);
    assert_eq!(csr.data, vec![2u32, 4, 4]);
}

#[test]
#[should_panic(expected = "key 2 out of range for 2 groups")]
fn test_unchecked_row_past_end_rejected() {
    let coo = Coo::from_parts(2, 3, vec![0i64, 2], vec![0i64, 1], vec![1.0f64, 2.0], false).unwrap();
    let _ = group_coo_rows(&coo, &sharded(2));
}

#[test]
#[should_panic(expected = "key -1 out of range for 3 groups")]
fn test_unchecked_negative_col_rejected() {
    let coo = Coo::from_parts(2, 3, vec![0i64, 1], vec![-1i64, 1], vec![1.0f64, 2.0], false).unwrap();
    let _ = coo_to_csc(&coo, &sharded(2));
}
