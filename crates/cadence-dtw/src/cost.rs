//! Pointwise feature distance and the accumulated-cost newtype.

use std::cmp::Ordering;
use std::fmt;

/// Pointwise distance between two feature vectors of equal dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Metric {
    /// Euclidean norm of the difference.
    #[default]
    Euclidean,
    /// Squared Euclidean norm of the difference. Cheaper; no square root.
    SquaredEuclidean,
}

impl Metric {
    /// Return the distance between `u` and `v`.
    ///
    /// Callers guarantee equal lengths; the engine checks dimensions once per
    /// call rather than per cell.
    #[inline]
    #[must_use]
    pub fn distance(self, u: &[f64], v: &[f64]) -> f64 {
        debug_assert_eq!(u.len(), v.len(), "feature dimensions differ");
        let sq: f64 = u.iter().zip(v).map(|(a, b)| (a - b) * (a - b)).sum();
        match self {
            Self::Euclidean => sq.sqrt(),
            Self::SquaredEuclidean => sq,
        }
    }
}

/// Where an alignment path may start and end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Boundary {
    /// The path runs from `(0, 0)` to `(n-1, m-1)`.
    #[default]
    Fixed,
    /// The path may start at any `(i, j)` for `skip_penalty * (i + j)` and end
    /// at any `(i, j)` for `skip_penalty * (n-1-i + m-1-j)`. Unmatched audio
    /// or text at either end is then charged per element instead of being
    /// forced into the alignment.
    Free,
}

/// Accumulated cost of an alignment path.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct AlignmentCost(f64);

impl AlignmentCost {
    /// Unreachable cell sentinel.
    pub const INFINITY: Self = Self(f64::INFINITY);

    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Return the raw cost value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Return true unless this is the unreachable sentinel.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// Total ordering comparison using [`f64::total_cmp`].
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for AlignmentCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euclidean_3_4_5() {
        assert_eq!(Metric::Euclidean.distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
    }

    #[test]
    fn squared_euclidean_skips_root() {
        assert_eq!(Metric::SquaredEuclidean.distance(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let u = [1.5, -2.0, 0.25];
        let v = [-0.5, 4.0, 1.0];
        for metric in [Metric::Euclidean, Metric::SquaredEuclidean] {
            assert_eq!(metric.distance(&u, &v), metric.distance(&v, &u));
        }
    }

    #[test]
    fn identical_vectors_have_zero_distance() {
        let u = [7.0, 8.0, 9.0];
        assert_eq!(Metric::Euclidean.distance(&u, &u), 0.0);
    }

    #[test]
    fn default_is_euclidean() {
        assert_eq!(Metric::default(), Metric::Euclidean);
    }

    #[test]
    fn display_format() {
        assert_eq!(format!("{}", AlignmentCost::new(1.234567)), "1.234567");
    }

    #[test]
    fn total_cmp_ordering() {
        let a = AlignmentCost::new(1.0);
        let b = AlignmentCost::new(2.0);
        assert_eq!(a.total_cmp(&b), Ordering::Less);
        assert_eq!(b.total_cmp(&AlignmentCost::INFINITY), Ordering::Less);
        assert!(!AlignmentCost::INFINITY.is_finite());
    }
}
