//! A resettable vector based on timestamps.

use std::ops::Index;

/// A vector which can be reset to its default value in amortized `O(1)`.
///
/// Each query of a matrix server touches only a tiny fraction of the nodes of a large road network,
/// so clearing per node state eagerly would dominate the running time of small queries.
/// Entries written before the last `reset` are reported as the default.
#[derive(Debug, Clone)]
pub struct TimestampedVector<T> {
    data: Vec<T>,
    // timestamp of the current generation, up to date entries carry this one
    current: u32,
    timestamps: Vec<u32>,
    default: T,
}

impl<T: Copy> TimestampedVector<T> {
    /// Create a new `TimestampedVector` with `size` elements of the default
    pub fn new(size: usize, default: T) -> TimestampedVector<T> {
        TimestampedVector {
            data: vec![default; size],
            current: 0,
            timestamps: vec![0; size],
            default,
        }
    }

    /// Reset all elements to the default.
    pub fn reset(&mut self) {
        let (new, overflow) = self.current.overflowing_add(1);
        self.current = new;

        // old timestamps may become current again after wrapping around
        if overflow {
            for (element, timestamp) in self.data.iter_mut().zip(self.timestamps.iter_mut()) {
                *element = self.default;
                *timestamp = 0;
            }
        }
    }

    /// Read an element, the default if it was not set in the current generation.
    #[inline]
    pub fn get(&self, index: usize) -> T {
        if self.timestamps[index] == self.current {
            self.data[index]
        } else {
            self.default
        }
    }

    /// Update an individual element.
    #[inline]
    pub fn set(&mut self, index: usize, value: T) {
        self.data[index] = value;
        self.timestamps[index] = self.current;
    }

    /// Number of elements in the data structure
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Are there no elements in the data structure
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Copy> Index<usize> for TimestampedVector<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        if self.timestamps[index] == self.current {
            &self.data[index]
        } else {
            &self.default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_restores_defaults() {
        let mut slots = TimestampedVector::new(4, None);
        slots.set(1, Some(10u32));
        slots.set(3, Some(30u32));
        assert_eq!(slots.get(1), Some(10));
        assert_eq!(slots[3], Some(30));
        assert_eq!(slots.get(0), None);

        slots.reset();
        assert_eq!(slots.get(1), None);
        assert_eq!(slots[3], None);

        slots.set(3, Some(5));
        assert_eq!(slots.get(3), Some(5));
    }
}
