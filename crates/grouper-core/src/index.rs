//! Integer types usable as group offsets and minor indices

use core::fmt::Debug;
use core::ops::AddAssign;

/// Integer type stored in offset arrays (`indptr`), per-thread budget/cursor
/// buffers and container index arrays.
///
/// Conversions to and from `usize` are lossless by contract; debug builds
/// assert it, release builds cast.
pub trait GroupIndex:
    Copy + Default + Debug + PartialOrd + AddAssign + Send + Sync + 'static
{
    const ZERO: Self;
    const ONE: Self;

    fn to_usize(self) -> usize;

    fn from_usize(x: usize) -> Self;

    /// `None` for negative values or values that do not fit `usize`.
    fn try_to_usize(self) -> Option<usize>;
}

macro_rules! impl_group_index {
    ($($t:ty),* $(,)?) => {
        $(
            impl GroupIndex for $t {
                const ZERO: Self = 0;
                const ONE: Self = 1;

                #[inline]
                fn to_usize(self) -> usize {
                    debug_assert!(usize::try_from(self).is_ok(), "index must fit in usize");
                    #[allow(
                        clippy::cast_sign_loss,
                        clippy::cast_possible_truncation,
                        clippy::cast_possible_wrap
                    )]
                    {
                        self as usize
                    }
                }

                #[inline]
                fn from_usize(x: usize) -> Self {
                    debug_assert!(<$t>::try_from(x).is_ok(), "value must fit in index type");
                    #[allow(
                        clippy::cast_sign_loss,
                        clippy::cast_possible_truncation,
                        clippy::cast_possible_wrap
                    )]
                    {
                        x as $t
                    }
                }

                #[inline]
                fn try_to_usize(self) -> Option<usize> {
                    usize::try_from(self).ok()
                }
            }
        )*
    };
}

impl_group_index!(u32, u64, usize, i32, i64);
