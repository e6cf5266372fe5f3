//! No space overhead `Option`s for types with sentinels

use std::fmt::Debug;

/// Trait to define sentinel values for types used with `InRangeOption`.
pub trait Sentinel: PartialEq + Copy {
    const SENTINEL: Self;
}

impl Sentinel for u32 {
    const SENTINEL: u32 = u32::MAX;
}

impl Sentinel for usize {
    const SENTINEL: usize = usize::MAX;
}

/// A struct to get `Option`s without space overhead.
///
/// Used for parent links in the search forest and for local id mappings,
/// where a full `Option<u32>` would double the memory footprint.
/// To work with the encapsulated data, the type has to be converted back into an actual `Option` through the `value` method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InRangeOption<T: Sentinel + Debug>(T);

impl<T: Sentinel + Debug> InRangeOption<T> {
    pub const NONE: Self = InRangeOption(T::SENTINEL);

    #[inline]
    pub fn new(value: Option<T>) -> InRangeOption<T> {
        match value {
            Some(value) => Self::some(value),
            None => Self::NONE,
        }
    }

    #[inline]
    pub fn some(value: T) -> InRangeOption<T> {
        assert_ne!(value, T::SENTINEL, "InRangeOption::some: Got sentinel as a value");
        InRangeOption(value)
    }

    #[inline]
    pub fn value(&self) -> Option<T> {
        let &InRangeOption(value) = self;
        if value != T::SENTINEL {
            Some(value)
        } else {
            None
        }
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        self.0 == T::SENTINEL
    }
}

impl<T: Sentinel + Debug> Default for InRangeOption<T> {
    fn default() -> Self {
        Self::NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_maps_to_none() {
        assert_eq!(InRangeOption::<u32>::NONE.value(), None);
        assert_eq!(InRangeOption::some(7u32).value(), Some(7));
        assert!(InRangeOption::<u32>::default().is_none());
    }

    #[test]
    #[should_panic]
    fn sentinel_cannot_be_wrapped() {
        InRangeOption::some(u32::MAX);
    }
}
