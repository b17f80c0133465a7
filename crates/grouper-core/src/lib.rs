//! Core data structures for grouper: sparse containers and the parallel
//! group builder that turns unordered `(key, value)` streams into CSR/CSC
//! layouts.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod compressed;
pub mod coo;
pub mod csc;
pub mod csr;
pub mod entry;
pub mod error;
pub mod group;
pub mod index;

pub use coo::Coo;
pub use csc::Csc;
pub use csr::Csr;
pub use entry::Entry;
pub use error::{Result, SparseError};
pub use group::{
    row_major_partition, GroupBuilder, ParallelGroupBuilder, RowMajorGroupBuilder, ThreadBudget, ThreadPush,
};
pub use index::GroupIndex;
