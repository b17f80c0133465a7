//! Structural checks shared by CSR and CSC

use crate::error::{Result, SparseError};
use crate::index::GroupIndex;

/// Names used in error messages for one compressed orientation.
pub(crate) struct Axes {
    pub major_len: &'static str,
    pub minor: &'static str,
    pub group: &'static str,
}

pub(crate) const CSR_AXES: Axes = Axes {
    major_len: "indptr (nrows + 1)",
    minor: "column",
    group: "row",
};

pub(crate) const CSC_AXES: Axes = Axes {
    major_len: "indptr (ncols + 1)",
    minor: "row",
    group: "column",
};

/// Lengths and endpoints only; cheap enough to run on every construction.
pub(crate) fn check_shape<I: GroupIndex>(
    nmajor: usize,
    indptr: &[I],
    nindices: usize,
    ndata: usize,
    axes: &Axes,
) -> Result<()> {
    let expected = nmajor
        .checked_add(1)
        .ok_or(SparseError::Overflow("major dimension"))?;
    if indptr.len() != expected {
        return Err(SparseError::Length {
            what: axes.major_len,
            expected,
            got: indptr.len(),
        });
    }
    if nindices != ndata {
        return Err(SparseError::Length {
            what: "indices and data",
            expected: ndata,
            got: nindices,
        });
    }
    if indptr.first().and_then(|p| p.try_to_usize()) != Some(0) {
        return Err(SparseError::IndptrStart);
    }
    if indptr.last().and_then(|p| p.try_to_usize()) != Some(ndata) {
        return Err(SparseError::IndptrEnd { nnz: ndata });
    }
    Ok(())
}

/// Monotone `indptr`, in-range minor indices and, if `require_sorted`,
/// strictly increasing minor indices inside every group.
pub(crate) fn check_groups<I: GroupIndex>(
    nminor: usize,
    indptr: &[I],
    indices: &[I],
    require_sorted: bool,
    axes: &Axes,
) -> Result<()> {
    let nnz = indices.len();
    for (group, bounds) in indptr.windows(2).enumerate() {
        let start = bounds[0].try_to_usize().filter(|&s| s <= nnz);
        let end = bounds[1].try_to_usize().filter(|&e| e <= nnz);
        let (Some(start), Some(end)) = (start, end) else {
            return Err(SparseError::IndptrOrder { at: group });
        };
        if end < start {
            return Err(SparseError::IndptrOrder { at: group + 1 });
        }
        let mut prev: Option<usize> = None;
        for (position, &raw) in indices[start..end].iter().enumerate() {
            let Some(minor) = raw.try_to_usize().filter(|&m| m < nminor) else {
                return Err(SparseError::IndexOutOfBounds {
                    axis: axes.minor,
                    position: start + position,
                    bound: nminor,
                });
            };
            if require_sorted && prev.is_some_and(|p| minor <= p) {
                return Err(SparseError::Unsorted {
                    axis: axes.minor,
                    group: axes.group,
                    at: group,
                });
            }
            prev = Some(minor);
        }
    }
    Ok(())
}
