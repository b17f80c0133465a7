//! Error types for container construction and kernel inputs

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SparseError {
    #[error("{what} length must be {expected}, got {got}")]
    Length {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{0} overflow")]
    Overflow(&'static str),

    #[error("indptr first element must be 0")]
    IndptrStart,

    #[error("indptr last element must equal nnz ({nnz})")]
    IndptrEnd { nnz: usize },

    #[error("indptr must be non-decreasing and within [0, nnz] (at position {at})")]
    IndptrOrder { at: usize },

    #[error("{axis} index out of bounds at position {position} (dimension {bound})")]
    IndexOutOfBounds {
        axis: &'static str,
        position: usize,
        bound: usize,
    },

    #[error("{axis} indices must be strictly increasing within each {group} (group {at})")]
    Unsorted {
        axis: &'static str,
        group: &'static str,
        at: usize,
    },
}

pub type Result<T> = std::result::Result<T, SparseError>;
