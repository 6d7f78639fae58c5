//! Banded cost matrix and the DTWBD fill recurrence.

use crate::band::Band;
use crate::cost::{Boundary, Metric};
use crate::path::AlignmentStep;
use crate::sequence::FeatureSequenceView;

/// Back-pointer stored by value in each cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Predecessor {
    /// The alignment starts here.
    Origin,
    /// No finite-cost transition reaches this cell.
    Unreachable,
    /// Coordinates of the cell this one was reached from.
    Cell { row: usize, col: usize },
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Cell {
    pub(crate) cost: f64,
    pub(crate) pred: Predecessor,
}

impl Cell {
    const UNREACHABLE: Self = Self {
        cost: f64::INFINITY,
        pred: Predecessor::Unreachable,
    };
}

/// Cumulative-cost matrix that only stores cells inside a [`Band`].
///
/// Row `i` occupies `cells[offsets[i]..offsets[i + 1]]`; column `j` of that
/// row lives at `offsets[i] + (j - band.lo(i))`.
#[derive(Debug)]
pub(crate) struct BandedMatrix {
    band: Band,
    offsets: Vec<usize>,
    cells: Vec<Cell>,
    boundary: Boundary,
}

impl BandedMatrix {
    pub(crate) fn new(band: Band) -> Self {
        let mut offsets = Vec::with_capacity(band.n_rows() + 1);
        let mut total = 0;
        offsets.push(0);
        for cols in band.rows() {
            total += cols.len();
            offsets.push(total);
        }
        Self {
            band,
            offsets,
            cells: vec![Cell::UNREACHABLE; total],
            boundary: Boundary::Fixed,
        }
    }

    pub(crate) fn band(&self) -> &Band {
        &self.band
    }

    pub(crate) fn boundary(&self) -> Boundary {
        self.boundary
    }

    fn index(&self, i: usize, j: usize) -> Option<usize> {
        if self.band.contains(i, j) {
            Some(self.offsets[i] + (j - self.band.lo(i)))
        } else {
            None
        }
    }

    /// Return the cell at `(i, j)`, or `None` outside the band.
    pub(crate) fn cell(&self, i: usize, j: usize) -> Option<&Cell> {
        self.index(i, j).map(|idx| &self.cells[idx])
    }

    /// Return the cumulative cost at `(i, j)`; `+inf` outside the band.
    pub(crate) fn cost(&self, i: usize, j: usize) -> f64 {
        self.cell(i, j).map_or(f64::INFINITY, |c| c.cost)
    }

    /// Run the DTWBD recurrence over every in-band cell.
    ///
    /// Candidates for `(i, j)`, tried in priority order so that ties keep the
    /// earlier one:
    ///
    /// | Transition | Source | Added cost |
    /// |---|---|---|
    /// | match | `(i-1, j-1)` | `d(s[i], t[j])` |
    /// | stretch | `(i-1, j)` | `d(s[i], t[j])` |
    /// | skip | `(i, j-1)` | `skip_penalty` |
    ///
    /// `(0, 0)` is the origin with cost `d(s[0], t[0])`. With
    /// [`Boundary::Free`] every cell may also be an origin, costing
    /// `skip_penalty * (i + j) + d(s[i], t[j])`; that candidate ranks last.
    pub(crate) fn fill(
        &mut self,
        reference: FeatureSequenceView<'_>,
        query: FeatureSequenceView<'_>,
        skip_penalty: f64,
        metric: Metric,
        boundary: Boundary,
    ) {
        debug_assert_eq!(reference.len(), self.band.n_rows());
        debug_assert_eq!(query.len(), self.band.n_cols());
        self.boundary = boundary;

        for i in 0..self.band.n_rows() {
            let s_i = reference.vector(i);
            for j in self.band.columns(i) {
                let cell = if i == 0 && j == 0 {
                    Cell {
                        cost: metric.distance(s_i, query.vector(0)),
                        pred: Predecessor::Origin,
                    }
                } else if boundary == Boundary::Free {
                    let d = metric.distance(s_i, query.vector(j));
                    let best = self.relax(i, j, || d, skip_penalty);
                    let start = skip_penalty * (i + j) as f64 + d;
                    if start < best.cost {
                        Cell {
                            cost: start,
                            pred: Predecessor::Origin,
                        }
                    } else {
                        best
                    }
                } else {
                    self.relax(i, j, || metric.distance(s_i, query.vector(j)), skip_penalty)
                };
                let idx = self.offsets[i] + (j - self.band.lo(i));
                self.cells[idx] = cell;
            }
        }
    }

    /// Pick the cheapest transition into `(i, j)`. The local distance is only
    /// evaluated when a match or stretch source is reachable.
    fn relax(&self, i: usize, j: usize, local: impl FnOnce() -> f64, skip_penalty: f64) -> Cell {
        let mut best = Cell::UNREACHABLE;

        if i > 0 {
            let diag = if j > 0 { self.cost(i - 1, j - 1) } else { f64::INFINITY };
            let above = self.cost(i - 1, j);
            if diag.is_finite() || above.is_finite() {
                let d = local();
                if diag + d < best.cost {
                    best = Cell {
                        cost: diag + d,
                        pred: Predecessor::Cell { row: i - 1, col: j - 1 },
                    };
                }
                if above + d < best.cost {
                    best = Cell {
                        cost: above + d,
                        pred: Predecessor::Cell { row: i - 1, col: j },
                    };
                }
            }
        }

        if j > 0 {
            let left = self.cost(i, j - 1) + skip_penalty;
            if left < best.cost {
                best = Cell {
                    cost: left,
                    pred: Predecessor::Cell { row: i, col: j - 1 },
                };
            }
        }

        best
    }

    /// Return the cell the path ends at and the total alignment cost.
    ///
    /// With [`Boundary::Fixed`] this is `(n-1, m-1)`. With [`Boundary::Free`]
    /// it is the in-band cell minimising
    /// `C(i, j) + skip_penalty * (n-1-i + m-1-j)`, earliest in fill order on
    /// ties. `None` if no candidate has finite cost.
    pub(crate) fn best_end(&self, skip_penalty: f64) -> Option<(AlignmentStep, f64)> {
        let (n, m) = (self.band.n_rows(), self.band.n_cols());
        let terminal = AlignmentStep { reference: n - 1, query: m - 1 };

        let best = match self.boundary {
            Boundary::Fixed => Some((terminal, self.cost(n - 1, m - 1))),
            Boundary::Free => {
                let mut best: Option<(AlignmentStep, f64)> = None;
                for (i, cols) in self.band.rows().enumerate() {
                    for j in cols {
                        let total = self.cost(i, j) + skip_penalty * ((n - 1 - i) + (m - 1 - j)) as f64;
                        if best.is_none_or(|(_, b)| total < b) {
                            best = Some((AlignmentStep { reference: i, query: j }, total));
                        }
                    }
                }
                best
            }
        };
        best.filter(|(_, cost)| cost.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::FeatureSequence;

    fn seq(values: &[f64]) -> FeatureSequence {
        FeatureSequence::new(values.to_vec(), 1).unwrap()
    }

    fn filled(s: &[f64], t: &[f64], skip: f64, band: Band) -> BandedMatrix {
        let (s, t) = (seq(s), seq(t));
        let mut matrix = BandedMatrix::new(band);
        matrix.fill(s.as_view(), t.as_view(), skip, Metric::Euclidean, Boundary::Fixed);
        matrix
    }

    fn filled_free(s: &[f64], t: &[f64], skip: f64) -> BandedMatrix {
        let (s, t) = (seq(s), seq(t));
        let mut matrix = BandedMatrix::new(Band::full(s.len(), t.len()));
        matrix.fill(s.as_view(), t.as_view(), skip, Metric::Euclidean, Boundary::Free);
        matrix
    }

    #[test]
    fn allocates_only_band_footprint() {
        let band = Band::diagonal(100, 50, 3);
        let footprint = band.footprint();
        let matrix = BandedMatrix::new(band);
        assert_eq!(matrix.cells.len(), footprint);
        assert!(footprint < 100 * 50);
    }

    #[test]
    fn origin_cell_holds_local_distance() {
        let m = filled(&[3.0], &[1.0], 1.0, Band::full(1, 1));
        let origin = m.cell(0, 0).unwrap();
        assert_eq!(origin.cost, 2.0);
        assert_eq!(origin.pred, Predecessor::Origin);
    }

    #[test]
    fn first_row_chains_skips() {
        // (0, j > 0) is reachable only by skip, whatever the local distance.
        let m = filled(&[0.0], &[0.0, 0.0, 0.0], 0.5, Band::full(1, 3));
        assert_eq!(m.cost(0, 1), 0.5);
        assert_eq!(m.cost(0, 2), 1.0);
        assert_eq!(m.cell(0, 2).unwrap().pred, Predecessor::Cell { row: 0, col: 1 });
    }

    #[test]
    fn first_column_chains_stretches() {
        let m = filled(&[0.0, 1.0, 3.0], &[0.0], 0.0, Band::full(3, 1));
        assert_eq!(m.cost(1, 0), 1.0);
        assert_eq!(m.cost(2, 0), 4.0);
        assert_eq!(m.cell(2, 0).unwrap().pred, Predecessor::Cell { row: 1, col: 0 });
    }

    #[test]
    fn hand_computed_2x2() {
        // s = [0, 1], t = [1, 0], skip = 5
        // C(0,0) = 1, C(0,1) = 1 + 5 = 6
        // C(1,0) = 0 + 1 = 1 (stretch)
        // C(1,1) = 1 + min(match 1, stretch 6) = 2, or skip 1 + 5 = 6
        let m = filled(&[0.0, 1.0], &[1.0, 0.0], 5.0, Band::full(2, 2));
        assert_eq!(m.cost(0, 1), 6.0);
        assert_eq!(m.cost(1, 0), 1.0);
        assert_eq!(m.cost(1, 1), 2.0);
        assert_eq!(m.cell(1, 1).unwrap().pred, Predecessor::Cell { row: 0, col: 0 });
    }

    #[test]
    fn ties_prefer_match() {
        // All local distances zero and zero skip penalty: every candidate ties.
        let m = filled(&[0.0, 0.0], &[0.0, 0.0], 0.0, Band::full(2, 2));
        assert_eq!(m.cell(1, 1).unwrap().pred, Predecessor::Cell { row: 0, col: 0 });
    }

    #[test]
    fn ties_prefer_match_over_skip() {
        // s = [0, 1, 1], t = [0, 1, 0], skip = 1
        // C(1,1) = 0 (match), C(1,2) = C(1,1) + 1 = 1 (skip)
        // C(2,1) = min(match C(1,0) + 0 = 1, stretch C(1,1) + 0 = 0) = 0
        // C(2,2): match C(1,1) + 1 = 1, stretch C(1,2) + 1 = 2, skip C(2,1) + 1 = 1
        let m = filled(&[0.0, 1.0, 1.0], &[0.0, 1.0, 0.0], 1.0, Band::full(3, 3));
        assert_eq!(m.cost(2, 1), 0.0);
        assert_eq!(m.cell(2, 1).unwrap().pred, Predecessor::Cell { row: 1, col: 1 });
        assert_eq!(m.cost(2, 2), 1.0);
        assert_eq!(m.cell(2, 2).unwrap().pred, Predecessor::Cell { row: 1, col: 1 });
    }

    #[test]
    fn skip_preferred_when_cheaper() {
        // t[1] = 50 is far from everything; skipping it costs only 1.
        let m = filled(&[0.0, 0.0], &[0.0, 50.0], 1.0, Band::full(2, 2));
        assert_eq!(m.cost(1, 1), 1.0);
        assert_eq!(m.cell(1, 1).unwrap().pred, Predecessor::Cell { row: 1, col: 0 });
    }

    #[test]
    fn out_of_band_reads_infinity() {
        let m = filled(&[0.0, 0.0, 0.0], &[0.0, 0.0, 0.0], 1.0, Band::diagonal(3, 3, 0));
        assert_eq!(m.cost(0, 2), f64::INFINITY);
        assert!(m.cell(2, 0).is_none());
        assert_eq!(m.cost(2, 2), 0.0);
    }

    #[test]
    fn fixed_end_is_terminal_cell() {
        let m = filled(&[0.0, 0.0], &[0.0, 50.0], 1.0, Band::full(2, 2));
        assert_eq!(m.best_end(1.0), Some((AlignmentStep { reference: 1, query: 1 }, 1.0)));
    }

    #[test]
    fn fixed_end_unreachable_is_none() {
        let m = filled(&[0.0], &[0.0, 0.0, 0.0], 1.0, Band::diagonal(1, 3, 0));
        assert!(m.best_end(1.0).is_some());
        let narrow = filled(&[0.0], &[0.0, 0.0, 0.0, 0.0], 1.0, Band::diagonal(1, 4, 1));
        assert_eq!(narrow.best_end(1.0), None);
    }

    #[test]
    fn free_start_skips_unmatched_leading_frames() {
        // s = [40, 40, 0], t = [0], skip = 1
        // C(1,0) = min(stretch 80, start 1 + 40) = 41
        // C(2,0) = min(stretch 41 + 0, start 2 + 0) = 2, a fresh origin
        let m = filled_free(&[40.0, 40.0, 0.0], &[0.0], 1.0);
        assert_eq!(m.cost(1, 0), 41.0);
        assert_eq!(m.cell(1, 0).unwrap().pred, Predecessor::Origin);
        assert_eq!(m.cost(2, 0), 2.0);
        assert_eq!(m.cell(2, 0).unwrap().pred, Predecessor::Origin);
        assert_eq!(m.best_end(1.0), Some((AlignmentStep { reference: 2, query: 0 }, 2.0)));
    }

    #[test]
    fn free_end_charges_trailing_elements() {
        // s = [0, 9], t = [0], skip = 1: ending at (0, 0) costs 0 + 1 for the
        // unmatched frame, cheaper than stretching onto 9.
        let m = filled_free(&[0.0, 9.0], &[0.0], 1.0);
        assert_eq!(m.best_end(1.0), Some((AlignmentStep { reference: 0, query: 0 }, 1.0)));
    }
}
