//! Per-row column windows restricting which matrix cells are computed.

use std::ops::Range;

use crate::error::AlignError;
use crate::path::AlignmentPath;

/// A connected band of valid cells in the `n x m` alignment matrix.
///
/// Row `i` owns the half-open column range `columns(i)`, i.e. the inclusive
/// range `[lo(i), hi(i)]`. Consecutive rows overlap or touch
/// (`lo(i + 1) <= hi(i) + 1`) and `hi` never decreases, so every row is
/// reachable from the origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Band {
    n_cols: usize,
    rows: Vec<Range<usize>>,
}

impl Band {
    /// Compute the diagonal band for an `n x m` matrix with the given radius.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::InvalidRadius`] | `radius` is negative |
    /// | [`AlignError::EmptySequence`] | `n` or `m` is zero |
    pub fn compute(n: usize, m: usize, radius: i64) -> Result<Self, AlignError> {
        let radius = usize::try_from(radius).map_err(|_| AlignError::InvalidRadius { radius })?;
        if n == 0 || m == 0 {
            return Err(AlignError::EmptySequence);
        }
        Ok(Self::diagonal(n, m, radius))
    }

    /// Diagonal band around `round(i * m / n)`. Requires `n, m >= 1`.
    ///
    /// The last row always reaches column `m - 1 - radius`, so a query longer
    /// than the reference is only cut off by the radius itself.
    pub(crate) fn diagonal(n: usize, m: usize, radius: usize) -> Self {
        debug_assert!(n > 0 && m > 0);
        let mut rows: Vec<(usize, usize)> = (0..n)
            .map(|i| {
                // round-half-up of i*m/n in integer arithmetic
                let center = ((2 * i * m + n) / (2 * n)).min(m - 1);
                let lo = center.saturating_sub(radius);
                let hi = center.saturating_add(radius).min(m - 1);
                (lo, hi)
            })
            .collect();
        if let Some(end) = rows.last_mut() {
            end.1 = end.1.max((m - 1).saturating_sub(radius));
        }
        Self::connected(m, rows)
    }

    /// The unrestricted band: every cell of the `n x m` matrix.
    #[must_use]
    pub fn full(n: usize, m: usize) -> Self {
        Self {
            n_cols: m,
            rows: vec![0..m; n],
        }
    }

    /// Project a half-resolution path onto an `n x m` matrix.
    ///
    /// Each coarse step `(i, j)` opens rows `2(i - r) ..= 2(i + r) + 1` over
    /// columns `2(j - r) ..= 2(j + r) + 1`, clamped to the matrix. The result
    /// is normalised so that it starts at `(0, 0)`, ends at `(n - 1, m - 1)`,
    /// and is connected.
    #[must_use]
    pub fn project(n: usize, m: usize, coarse: &AlignmentPath, radius: usize) -> Self {
        debug_assert!(n > 0 && m > 0);
        let mut window: Vec<Option<(usize, usize)>> = vec![None; n];

        let widen = |k: usize, len: usize| {
            let lo = (2 * k).saturating_sub(radius.saturating_mul(2)).min(len - 1);
            let hi = (2 * k)
                .saturating_add(radius.saturating_mul(2))
                .saturating_add(1)
                .min(len - 1);
            (lo, hi)
        };

        for step in coarse {
            let (row_lo, row_hi) = widen(step.reference, n);
            let (col_lo, col_hi) = widen(step.query, m);

            for slot in window.iter_mut().take(row_hi + 1).skip(row_lo) {
                *slot = Some(match *slot {
                    Some((lo, hi)) => (lo.min(col_lo), hi.max(col_hi)),
                    None => (col_lo, col_hi),
                });
            }
        }

        let mut rows = Vec::with_capacity(n);
        let mut last = (0, 0);
        for slot in window {
            last = slot.unwrap_or(last);
            rows.push(last);
        }
        if let Some(end) = rows.last_mut() {
            end.1 = m - 1;
        }
        Self::connected(m, rows)
    }

    /// Build a band from inclusive `(lo, hi)` pairs, widening rows so that the
    /// first row starts at column 0, `hi` never decreases, and no row leaves a
    /// gap after the row above it.
    fn connected(n_cols: usize, inclusive: Vec<(usize, usize)>) -> Self {
        let mut rows: Vec<Range<usize>> = Vec::with_capacity(inclusive.len());
        for (lo, hi) in inclusive {
            let (lo, hi) = match rows.last() {
                Some(prev) => {
                    let hi = hi.max(prev.end - 1);
                    (lo.min(prev.end).min(hi), hi)
                }
                None => (0, hi),
            };
            rows.push(lo..hi + 1);
        }
        Self { n_cols, rows }
    }

    /// Return the number of rows (reference length).
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Return the number of columns (query length).
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Return the half-open column range of row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.n_rows()`.
    #[must_use]
    pub fn columns(&self, i: usize) -> Range<usize> {
        self.rows[i].clone()
    }

    /// First valid column of row `i`.
    #[must_use]
    pub fn lo(&self, i: usize) -> usize {
        self.rows[i].start
    }

    /// Last valid column of row `i` (inclusive).
    #[must_use]
    pub fn hi(&self, i: usize) -> usize {
        self.rows[i].end - 1
    }

    /// Return true if `(i, j)` lies inside the band.
    #[must_use]
    pub fn contains(&self, i: usize, j: usize) -> bool {
        self.rows.get(i).is_some_and(|r| r.contains(&j))
    }

    /// Return the number of cells the band materialises.
    #[must_use]
    pub fn footprint(&self) -> usize {
        self.rows.iter().map(ExactSizeIterator::len).sum()
    }

    /// Return the widest row.
    #[must_use]
    pub fn max_width(&self) -> usize {
        self.rows.iter().map(ExactSizeIterator::len).max().unwrap_or(0)
    }

    /// Iterate over the half-open column range of each row.
    pub fn rows(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.rows.iter().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::AlignmentStep;

    fn assert_connected(band: &Band) {
        assert_eq!(band.lo(0), 0, "band must start at column 0");
        for i in 1..band.n_rows() {
            assert!(band.lo(i) <= band.hi(i - 1) + 1, "gap between rows {} and {i}", i - 1);
            assert!(band.hi(i) >= band.hi(i - 1), "hi decreased at row {i}");
            assert!(band.lo(i) <= band.hi(i));
        }
    }

    #[test]
    fn rejects_negative_radius() {
        assert!(matches!(
            Band::compute(4, 4, -1),
            Err(AlignError::InvalidRadius { radius: -1 })
        ));
    }

    #[test]
    fn rejects_empty_dimensions() {
        assert!(matches!(Band::compute(0, 4, 1), Err(AlignError::EmptySequence)));
        assert!(matches!(Band::compute(4, 0, 1), Err(AlignError::EmptySequence)));
    }

    #[test]
    fn square_radius_zero_is_diagonal() {
        let band = Band::compute(3, 3, 0).unwrap();
        assert_eq!(band.columns(0), 0..1);
        assert_eq!(band.columns(1), 1..2);
        assert_eq!(band.columns(2), 2..3);
        assert_eq!(band.footprint(), 3);
    }

    #[test]
    fn centers_follow_slope() {
        // n = 10, m = 5: center(i) = round(i / 2), half rounds up
        let band = Band::compute(10, 5, 0).unwrap();
        let los: Vec<usize> = (0..10).map(|i| band.lo(i)).collect();
        assert_eq!(los, vec![0, 1, 1, 2, 2, 3, 3, 4, 4, 4]);
    }

    #[test]
    fn radius_clamps_to_matrix() {
        let band = Band::compute(10, 5, 1).unwrap();
        assert_eq!(band.columns(0), 0..2);
        assert_eq!(band.columns(9), 3..5);
    }

    #[test]
    fn steep_slope_is_widened_to_close_gaps() {
        // n = 2, m = 10, radius 0: centers 0 and 5 would leave columns 1..5
        // uncovered, and the last row is stretched to the final column.
        let band = Band::compute(2, 10, 0).unwrap();
        assert_eq!(band.columns(0), 0..1);
        assert_eq!(band.columns(1), 1..10);
        assert_connected(&band);
    }

    #[test]
    fn last_row_reaches_within_radius_of_final_column() {
        // n = 2, m = 10, radius 1: center(1) = 5, raised to hi = 10 - 1 - 1
        let band = Band::compute(2, 10, 1).unwrap();
        assert_eq!(band.hi(1), 8);
        assert!(!band.contains(1, 9));
    }

    #[test]
    fn large_radius_degenerates_to_full() {
        let band = Band::compute(6, 4, 6).unwrap();
        assert_eq!(band, Band::full(6, 4));
        assert_eq!(band.footprint(), 24);
    }

    #[test]
    fn diagonal_bands_are_connected() {
        for n in 1..12 {
            for m in 1..12 {
                for r in 0..4 {
                    let band = Band::compute(n, m, r).unwrap();
                    assert_eq!(band.n_rows(), n);
                    assert_eq!(band.n_cols(), m);
                    assert_connected(&band);
                    assert!(
                        band.hi(n - 1) + r as usize >= m - 1,
                        "n={n} m={m} r={r}: hi(n-1) = {}",
                        band.hi(n - 1)
                    );
                    if n >= m {
                        assert_eq!(band.hi(n - 1), m - 1, "n={n} m={m} r={r}");
                    }
                }
            }
        }
    }

    #[test]
    fn contains_respects_rows() {
        let band = Band::compute(3, 3, 0).unwrap();
        assert!(band.contains(1, 1));
        assert!(!band.contains(1, 2));
        assert!(!band.contains(3, 0));
    }

    #[test]
    fn projection_covers_coarse_path_and_terminal() {
        let coarse = AlignmentPath::new(
            vec![
                AlignmentStep { reference: 0, query: 0 },
                AlignmentStep { reference: 1, query: 1 },
                AlignmentStep { reference: 2, query: 1 },
            ],
            3,
            2,
        );
        let band = Band::project(7, 5, &coarse, 0);
        assert_eq!(band.n_rows(), 7);
        assert_connected(&band);
        assert!(band.contains(0, 0));
        // coarse (1, 1) covers fine rows 2..=3 and columns 2..=3
        assert_eq!(band.columns(2), 2..4);
        assert_eq!(band.columns(5), 2..4);
        assert!(!band.contains(2, 1));
        assert!(band.contains(6, 4));
    }

    #[test]
    fn projection_doubles_both_coordinates() {
        let coarse = AlignmentPath::new(
            (0..8).map(|k| AlignmentStep { reference: k, query: k }).collect(),
            8,
            8,
        );
        let band = Band::project(16, 16, &coarse, 1);
        assert_connected(&band);
        for i in 0..16 {
            assert!(band.contains(i, i), "diagonal cell ({i}, {i}) missing");
            assert!(band.hi(i) <= i + 5, "row {i} too wide: {:?}", band.columns(i));
        }
    }

    #[test]
    fn projection_with_wide_radius_is_full() {
        let coarse = AlignmentPath::new(
            vec![
                AlignmentStep { reference: 0, query: 0 },
                AlignmentStep { reference: 1, query: 1 },
            ],
            2,
            2,
        );
        let band = Band::project(4, 4, &coarse, 4);
        assert_eq!(band, Band::full(4, 4));
    }
}
