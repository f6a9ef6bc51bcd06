use crate::sample::Timestamp;
use serde::Serialize;

/// Closed interval `[lower, upper]`.
///
/// "No range" (a section without samples) is expressed as `Option::None`
/// rather than an empty interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Range<T> {
    pub lower: T,
    pub upper: T,
}

/// Value (y axis) range.
pub type ValueRange = Range<f64>;

/// Time (x axis) range.
pub type TimeRange = Range<Timestamp>;

impl<T: PartialOrd + Copy> Range<T> {
    /// Build a range from two bounds given in any order.
    pub fn new(a: T, b: T) -> Self {
        if b < a {
            Self { lower: b, upper: a }
        } else {
            Self { lower: a, upper: b }
        }
    }

    pub fn point(v: T) -> Self {
        Self { lower: v, upper: v }
    }

    /// Grow the range so that it contains `v`.
    pub fn include(&mut self, v: T) {
        if v < self.lower {
            self.lower = v;
        }
        if v > self.upper {
            self.upper = v;
        }
    }

    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        let mut merged = self;
        merged.include(other.lower);
        merged.include(other.upper);
        merged
    }

    /// Union of two optional ranges: a missing side yields the other one unchanged.
    pub fn union(a: Option<Self>, b: Option<Self>) -> Option<Self> {
        match (a, b) {
            (Some(a), Some(b)) => Some(a.merge(b)),
            (Some(a), None) => Some(a),
            (None, b) => b,
        }
    }

    /// Smallest range covering every item, `None` for an empty iterator.
    pub fn covering(values: impl IntoIterator<Item = T>) -> Option<Self> {
        values.into_iter().fold(None, |acc, v| match acc {
            None => Some(Self::point(v)),
            Some(mut r) => {
                r.include(v);
                Some(r)
            }
        })
    }

    pub fn contains(&self, v: T) -> bool {
        self.lower <= v && v <= self.upper
    }
}
