//! Small helpers without a better home.

use std::cmp::Ordering;

pub mod in_range_option;

/// Totally ordered wrapper for floating point keys which are known not to be NaN.
/// Infinity is fine and sorts last.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct NonNan(f64);

impl NonNan {
    pub fn new(val: f64) -> Option<NonNan> {
        if val.is_nan() {
            None
        } else {
            Some(NonNan(val))
        }
    }

    /// Construct without the check.
    /// Only for values which cannot be NaN by construction (sums and minima of non negative weights).
    #[inline]
    pub fn assume(val: f64) -> NonNan {
        debug_assert!(!val.is_nan());
        NonNan(val)
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl Eq for NonNan {}

impl Ord for NonNan {
    fn cmp(&self, other: &NonNan) -> Ordering {
        // total_cmp agrees with partial_cmp on everything but NaN and signed zeros
        self.0.total_cmp(&other.0)
    }
}
