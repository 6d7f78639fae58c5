//! DTWBD alignment engine.

use rayon::prelude::*;
use tracing::{debug, error, instrument};

use crate::band::Band;
use crate::cost::{AlignmentCost, Boundary, Metric};
use crate::error::AlignError;
use crate::matrix::BandedMatrix;
use crate::path::{AlignmentPath, reconstruct};
use crate::sequence::FeatureSequenceView;

/// Result of one alignment: the accumulated cost and the path achieving it.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    /// Cumulative cost of the path, including free-boundary charges.
    pub distance: AlignmentCost,
    /// Path from `(0, 0)` to `(n-1, m-1)`, or between the chosen start and
    /// end cells with [`Boundary::Free`].
    pub path: AlignmentPath,
}

/// Immutable aligner configuration. Thread-safe and copyable.
///
/// # Defaults
///
/// | Parameter | Default |
/// |-----------|---------|
/// | `metric`  | [`Metric::Euclidean`] |
/// | `boundary` | [`Boundary::Fixed`] |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aligner {
    skip_penalty: f64,
    radius: usize,
    metric: Metric,
    boundary: Boundary,
}

impl Aligner {
    /// Create an aligner with the given skip penalty and band radius.
    ///
    /// A radius at least `max(n, m)` computes the full matrix.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::InvalidPenalty`] | `skip_penalty` is negative, NaN, or infinite |
    /// | [`AlignError::InvalidRadius`] | `radius` is negative |
    pub fn new(skip_penalty: f64, radius: i64) -> Result<Self, AlignError> {
        if !skip_penalty.is_finite() || skip_penalty < 0.0 {
            return Err(AlignError::InvalidPenalty { penalty: skip_penalty });
        }
        let radius = usize::try_from(radius).map_err(|_| AlignError::InvalidRadius { radius })?;
        Ok(Self {
            skip_penalty,
            radius,
            metric: Metric::default(),
            boundary: Boundary::default(),
        })
    }

    /// Set the pointwise feature distance.
    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Set where the path may start and end.
    #[must_use]
    pub fn with_boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = boundary;
        self
    }

    /// Return the skip penalty.
    #[must_use]
    pub fn skip_penalty(&self) -> f64 {
        self.skip_penalty
    }

    /// Return the band radius.
    #[must_use]
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Return the pointwise feature distance.
    #[must_use]
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Return the path boundary mode.
    #[must_use]
    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    /// Align `query` against `reference` inside the diagonal band.
    ///
    /// Runs in O(n * w) time and memory, where `w` is the band width
    /// (at most `2 * radius + 1` for `n >= m`).
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::DimensionMismatch`] | The sequences have different feature dimensions |
    /// | [`AlignError::Infeasible`] | `(n-1, m-1)` is unreachable inside the band (fixed boundaries only) |
    /// | [`AlignError::Corrupt`] | Internal back-pointer invariant violated |
    #[instrument(skip(self, reference, query), fields(n = reference.len(), m = query.len(), radius = self.radius, boundary = ?self.boundary))]
    pub fn align(
        &self,
        reference: FeatureSequenceView<'_>,
        query: FeatureSequenceView<'_>,
    ) -> Result<Alignment, AlignError> {
        check_dimensions(reference, query)?;
        let band = Band::diagonal(reference.len(), query.len(), self.radius);
        self.align_in_band(reference, query, band)
    }

    /// Align by coarse-to-fine refinement.
    ///
    /// Both sequences are repeatedly halved until either is shorter than
    /// `2 * (radius + 1) + 1`; that level is aligned over the full matrix, and
    /// each finer level is aligned inside the band projected from the
    /// coarser path. Much cheaper than [`align`](Self::align) with a wide
    /// radius; the result may be costlier than the banded optimum.
    ///
    /// # Errors
    ///
    /// Same as [`align`](Self::align), except that the projected band always
    /// contains the terminal cell so `Infeasible` cannot occur.
    #[instrument(skip(self, reference, query), fields(n = reference.len(), m = query.len(), radius = self.radius))]
    pub fn align_multiscale(
        &self,
        reference: FeatureSequenceView<'_>,
        query: FeatureSequenceView<'_>,
    ) -> Result<Alignment, AlignError> {
        check_dimensions(reference, query)?;
        self.refine(reference, query, 0)
    }

    fn refine(
        &self,
        reference: FeatureSequenceView<'_>,
        query: FeatureSequenceView<'_>,
        depth: usize,
    ) -> Result<Alignment, AlignError> {
        let (n, m) = (reference.len(), query.len());
        let min_len = self.radius.saturating_add(1).saturating_mul(2).saturating_add(1);

        let coarse = if n < min_len || m < min_len {
            None
        } else {
            reference.coarsen().zip(query.coarsen())
        };
        let Some((coarse_ref, coarse_query)) = coarse else {
            debug!(depth, n, m, "coarsest level, aligning over the full matrix");
            return self.align_in_band(reference, query, Band::full(n, m));
        };

        let coarse_alignment = self.refine(coarse_ref.as_view(), coarse_query.as_view(), depth + 1)?;
        let band = Band::project(n, m, &coarse_alignment.path, self.radius);
        debug!(depth, n, m, "refining inside projected band");
        self.align_in_band(reference, query, band)
    }

    /// Align many independent pairs in parallel, e.g. one per chapter.
    ///
    /// Results are returned in input order. Each pair fails or succeeds on
    /// its own.
    #[must_use]
    #[instrument(skip(self, pairs), fields(n_pairs = pairs.len()))]
    pub fn align_batch(
        &self,
        pairs: &[(FeatureSequenceView<'_>, FeatureSequenceView<'_>)],
    ) -> Vec<Result<Alignment, AlignError>> {
        pairs
            .par_iter()
            .map(|&(reference, query)| self.align(reference, query))
            .collect()
    }

    /// Align and write the result into caller-owned outputs.
    ///
    /// On success writes the distance and the interleaved path, and returns
    /// the number of pairs written. On failure neither output is touched.
    ///
    /// # Errors
    ///
    /// As [`align`](Self::align), plus [`AlignError::BufferTooSmall`] when
    /// `path_buffer` holds fewer than `path.len()` pairs. A buffer of
    /// `2 * (n + m)` entries is always enough.
    pub fn align_into(
        &self,
        reference: FeatureSequenceView<'_>,
        query: FeatureSequenceView<'_>,
        path_distance: &mut f64,
        path_buffer: &mut [usize],
    ) -> Result<usize, AlignError> {
        let alignment = self.align(reference, query)?;
        let written = alignment.path.write_pairs(path_buffer)?;
        *path_distance = alignment.distance.value();
        Ok(written)
    }

    fn align_in_band(
        &self,
        reference: FeatureSequenceView<'_>,
        query: FeatureSequenceView<'_>,
        band: Band,
    ) -> Result<Alignment, AlignError> {
        let (n, m) = (reference.len(), query.len());
        debug!(footprint = band.footprint(), max_width = band.max_width(), "band ready");

        let mut matrix = BandedMatrix::new(band);
        matrix.fill(reference, query, self.skip_penalty, self.metric, self.boundary);

        let Some((end, distance)) = matrix.best_end(self.skip_penalty) else {
            return Err(AlignError::Infeasible {
                n_reference: n,
                n_query: m,
                radius: self.radius,
            });
        };

        let path = reconstruct(&matrix, end).inspect_err(|e| error!(%e, "alignment matrix is corrupt"))?;
        Ok(Alignment {
            distance: AlignmentCost::new(distance),
            path,
        })
    }
}

fn check_dimensions(
    reference: FeatureSequenceView<'_>,
    query: FeatureSequenceView<'_>,
) -> Result<(), AlignError> {
    if reference.dim() != query.dim() {
        return Err(AlignError::DimensionMismatch {
            reference: reference.dim(),
            query: query.dim(),
        });
    }
    Ok(())
}
