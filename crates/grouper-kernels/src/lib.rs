//! Parallel grouping kernels for grouper (pure Rust, rayon-driven)
//!
//! Every kernel here is a two-pass count-then-scatter over the
//! [`grouper_core::group`] builder: budgets per shard, one serial prefix
//! step, then lock-free pushes into disjoint ranges.

pub mod config;
pub mod convert;
pub mod page;
pub mod transform;
pub mod util;

pub use config::ParallelConfig;
pub use convert::{
    coo_to_csc, coo_to_csr, group_coo_cols, group_coo_rows, sort_indices, sort_indices_csc,
    sum_duplicates, sum_duplicates_csc,
};
pub use page::{CsrPage, DenseBatch};
pub use transform::{csc_to_csr, csr_to_csc, transpose};
