//! Alignment path types and back-pointer reconstruction.

use std::ops::RangeInclusive;

use crate::cost::{Boundary, Metric};
use crate::error::AlignError;
use crate::matrix::{BandedMatrix, Predecessor};
use crate::sequence::FeatureSequenceView;

/// A single step in an alignment path, pairing reference frame `reference`
/// with query element `query`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlignmentStep {
    /// Index in the reference sequence.
    pub reference: usize,
    /// Index in the query sequence.
    pub query: usize,
}

/// How a step was entered from the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Both sequences advance.
    Match,
    /// The reference advances; the query element covers another frame.
    Stretch,
    /// The query advances without consuming a reference frame.
    Skip,
}

impl Transition {
    fn between(from: AlignmentStep, to: AlignmentStep) -> Option<Self> {
        let di = to.reference.checked_sub(from.reference)?;
        let dj = to.query.checked_sub(from.query)?;
        match (di, dj) {
            (1, 1) => Some(Self::Match),
            (1, 0) => Some(Self::Stretch),
            (0, 1) => Some(Self::Skip),
            _ => None,
        }
    }
}

/// An ordered sequence of steps through an `n x m` alignment matrix.
///
/// With fixed boundaries the path runs from `(0, 0)` to `(n-1, m-1)`; with
/// free boundaries it may start and end anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentPath {
    steps: Vec<AlignmentStep>,
    n_reference: usize,
    n_query: usize,
}

impl AlignmentPath {
    pub(crate) fn new(steps: Vec<AlignmentStep>, n_reference: usize, n_query: usize) -> Self {
        Self {
            steps,
            n_reference,
            n_query,
        }
    }

    /// Return the steps as a slice.
    #[must_use]
    pub fn steps(&self) -> &[AlignmentStep] {
        &self.steps
    }

    /// Return the number of steps in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Return true if the path contains no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Return the length of the reference sequence that was aligned.
    #[must_use]
    pub fn n_reference(&self) -> usize {
        self.n_reference
    }

    /// Return the length of the query sequence that was aligned.
    #[must_use]
    pub fn n_query(&self) -> usize {
        self.n_query
    }

    /// Return the reference frames between the first and last step.
    ///
    /// Frames outside this range are unmatched audio at the head or tail,
    /// which only a free-boundary alignment leaves out.
    #[must_use]
    pub fn reference_span(&self) -> Option<RangeInclusive<usize>> {
        Some(self.steps.first()?.reference..=self.steps.last()?.reference)
    }

    /// Return the transition that entered each step after the first.
    ///
    /// A pair of steps that is not one transition apart contributes nothing.
    #[must_use]
    pub fn transitions(&self) -> Vec<Transition> {
        self.steps
            .windows(2)
            .filter_map(|w| Transition::between(w[0], w[1]))
            .collect()
    }

    /// Return the query indices entered only by skips, i.e. the query
    /// elements with no matching reference material.
    #[must_use]
    pub fn skipped_queries(&self) -> Vec<usize> {
        self.query_spans()
            .iter()
            .enumerate()
            .filter_map(|(j, span)| span.is_none().then_some(j))
            .collect()
    }

    /// Return, per query index, the reference frames consumed by it.
    ///
    /// Frames are consumed by the first step and by steps entered through a
    /// match or stretch. A skipped query element, including any before the
    /// first or after the last step, gets `None`.
    #[must_use]
    pub fn query_spans(&self) -> Vec<Option<RangeInclusive<usize>>> {
        let mut spans: Vec<Option<RangeInclusive<usize>>> = vec![None; self.n_query];
        let Some(first) = self.steps.first() else {
            return spans;
        };
        spans[first.query] = Some(first.reference..=first.reference);

        for w in self.steps.windows(2) {
            if !matches!(
                Transition::between(w[0], w[1]),
                Some(Transition::Match | Transition::Stretch)
            ) {
                continue;
            }
            let step = w[1];
            let span = &mut spans[step.query];
            *span = Some(match span.take() {
                Some(r) => *r.start().min(&step.reference)..=*r.end().max(&step.reference),
                None => step.reference..=step.reference,
            });
        }
        spans
    }

    /// Re-sum the transition costs along the path.
    ///
    /// Elements before the first step and after the last are charged
    /// `skip_penalty` each, which is zero for a fixed-boundary path. Equals
    /// the aligner's reported distance for a path it produced with the same
    /// inputs, penalty, and metric.
    #[must_use]
    pub fn replay_cost(
        &self,
        reference: FeatureSequenceView<'_>,
        query: FeatureSequenceView<'_>,
        skip_penalty: f64,
        metric: Metric,
    ) -> f64 {
        let local = |s: AlignmentStep| metric.distance(reference.vector(s.reference), query.vector(s.query));
        let (Some(&first), Some(&last)) = (self.steps.first(), self.steps.last()) else {
            return 0.0;
        };
        let mut total = skip_penalty * (first.reference + first.query) as f64 + local(first);
        for w in self.steps.windows(2) {
            total += match Transition::between(w[0], w[1]) {
                Some(Transition::Match | Transition::Stretch) => local(w[1]),
                Some(Transition::Skip) => skip_penalty,
                None => continue,
            };
        }
        let trailing = (self.n_reference - 1 - last.reference) + (self.n_query - 1 - last.query);
        total + skip_penalty * trailing as f64
    }

    /// Write the path as interleaved `(reference, query)` pairs.
    ///
    /// Returns the number of pairs written. Leaves `buffer` untouched on error.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::BufferTooSmall`] if `buffer.len() / 2 < self.len()`.
    pub fn write_pairs(&self, buffer: &mut [usize]) -> Result<usize, AlignError> {
        let capacity = buffer.len() / 2;
        if capacity < self.len() {
            return Err(AlignError::BufferTooSmall {
                needed: self.len(),
                capacity,
            });
        }
        for (pair, step) in buffer.chunks_exact_mut(2).zip(&self.steps) {
            pair[0] = step.reference;
            pair[1] = step.query;
        }
        Ok(self.len())
    }
}

impl<'a> IntoIterator for &'a AlignmentPath {
    type Item = &'a AlignmentStep;
    type IntoIter = std::slice::Iter<'a, AlignmentStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

/// Walk back-pointers from `end` to an origin and return the path in forward
/// order.
///
/// Every hop must stay inside the band and be one legal transition, and the
/// walk must finish within `n + m` steps; otherwise the matrix is corrupt.
/// Origins other than `(0, 0)` are legal only with [`Boundary::Free`].
pub(crate) fn reconstruct(matrix: &BandedMatrix, end: AlignmentStep) -> Result<AlignmentPath, AlignError> {
    let band = matrix.band();
    let (n, m) = (band.n_rows(), band.n_cols());
    let bound = n + m;
    let free = matrix.boundary() == Boundary::Free;

    let mut steps = Vec::with_capacity(n.max(m));
    let mut at = end;

    loop {
        let corrupt = AlignError::Corrupt { steps: steps.len() };
        if steps.len() >= bound {
            return Err(corrupt);
        }
        let cell = matrix.cell(at.reference, at.query).ok_or(corrupt.clone())?;
        steps.push(at);

        match cell.pred {
            Predecessor::Origin if free || (at.reference == 0 && at.query == 0) => break,
            Predecessor::Cell { row, col } => {
                let prev = AlignmentStep { reference: row, query: col };
                if Transition::between(prev, at).is_none() {
                    return Err(corrupt);
                }
                at = prev;
            }
            Predecessor::Origin | Predecessor::Unreachable => return Err(corrupt),
        }
    }

    steps.reverse();
    Ok(AlignmentPath::new(steps, n, m))
}
