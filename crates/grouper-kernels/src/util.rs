//! Shared constants and sharding helpers for the kernels

use core::ops::Range;

/// Threshold (entries) below which kernels use a single shard
pub const SMALL_NNZ_LIMIT: usize = 32 * 1024;

/// Shard `t` of `0..len` split into `nshard` contiguous, near-equal pieces.
#[inline]
#[must_use]
#[allow(
    clippy::manual_div_ceil,
    reason = "Use of (a + b - 1) / b is intentional for broad compiler compatibility"
)]
pub fn even_shard(len: usize, nshard: usize, t: usize) -> Range<usize> {
    debug_assert!(nshard > 0 && t < nshard);
    let chunk = (len + nshard - 1) / nshard;
    let start = (t * chunk).min(len);
    let end = (start + chunk).min(len);
    start..end
}
