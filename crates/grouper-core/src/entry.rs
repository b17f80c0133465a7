//! Minor index plus value, the element type grouped by the kernels

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Entry<T, I> {
    pub index: I,
    pub value: T,
}

impl<T, I> Entry<T, I> {
    #[inline]
    #[must_use]
    pub const fn new(index: I, value: T) -> Self {
        Self { index, value }
    }
}
