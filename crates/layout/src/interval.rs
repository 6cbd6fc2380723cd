use rand::Rng;

use crate::error::LayoutError;

/// Closed integer range `[min, max]`, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    min: i32,
    max: i32,
}

impl Interval {
    /// Build an interval from two endpoints given in any order.
    pub fn new(a: i32, b: i32) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn min(self) -> i32 {
        self.min
    }

    pub fn max(self) -> i32 {
        self.max
    }

    /// Number of integers covered. Never zero.
    pub fn size(self) -> i32 {
        self.max - self.min + 1
    }

    pub fn contains(self, value: i32) -> bool {
        self.min <= value && value <= self.max
    }

    /// Whether `other` lies entirely inside this interval.
    pub fn covers(self, other: Interval) -> bool {
        self.min <= other.min && other.max <= self.max
    }

    pub fn intersects(self, other: Interval) -> bool {
        self.max.min(other.max) >= self.min.max(other.min)
    }

    /// Overlap of the two intervals.
    pub fn intersect(self, other: Interval) -> Result<Interval, LayoutError> {
        if !self.intersects(other) {
            return Err(LayoutError::DisjointIntervals { a: self, b: other });
        }
        Ok(Interval::new(
            self.min.max(other.min),
            self.max.min(other.max),
        ))
    }

    /// Smallest interval containing both.
    pub fn hull(self, other: Interval) -> Interval {
        Interval::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Uniformly distributed integer in `[min, max]`.
    pub fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> i32 {
        rng.random_range(self.min..=self.max)
    }

    pub fn iter(self) -> std::ops::RangeInclusive<i32> {
        self.min..=self.max
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}
