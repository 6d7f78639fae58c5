//! Feature sequence types with validation guarantees.
//!
//! A sequence is one contiguous row-major buffer: vector `i` occupies
//! `values[i * dim..(i + 1) * dim]`.

use crate::error::AlignError;

fn validate(values: &[f64], dim: usize) -> Result<(), AlignError> {
    if dim == 0 {
        return Err(AlignError::ZeroDimension);
    }
    if values.is_empty() {
        return Err(AlignError::EmptySequence);
    }
    if values.len() % dim != 0 {
        return Err(AlignError::RaggedBuffer { len: values.len(), dim });
    }
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(AlignError::NonFiniteValue { index });
    }
    Ok(())
}

/// Owned, validated feature sequence. Guaranteed non-empty, dimension >= 1, all finite.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSequence {
    values: Vec<f64>,
    dim: usize,
}

impl FeatureSequence {
    /// Create a sequence from a row-major buffer of `dim`-dimensional vectors.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::ZeroDimension`] | `dim` is zero |
    /// | [`AlignError::EmptySequence`] | `values` is empty |
    /// | [`AlignError::RaggedBuffer`] | `values.len()` is not a multiple of `dim` |
    /// | [`AlignError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn new(values: Vec<f64>, dim: usize) -> Result<Self, AlignError> {
        validate(&values, dim)?;
        Ok(Self { values, dim })
    }

    /// Create a sequence from one `Vec` per feature vector.
    ///
    /// # Errors
    ///
    /// As [`FeatureSequence::new`]; rows of unequal length report
    /// [`AlignError::RaggedBuffer`].
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, AlignError> {
        let dim = rows.first().map_or(0, Vec::len);
        if rows.is_empty() {
            return Err(AlignError::EmptySequence);
        }
        let total: usize = rows.iter().map(Vec::len).sum();
        if rows.iter().any(|r| r.len() != dim) {
            return Err(AlignError::RaggedBuffer { len: total, dim });
        }
        Self::new(rows.concat(), dim)
    }

    /// Borrow this sequence as a zero-copy view.
    #[must_use]
    pub fn as_view(&self) -> FeatureSequenceView<'_> {
        FeatureSequenceView::new_unchecked(&self.values, self.dim)
    }

    /// Return the number of feature vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len() / self.dim
    }

    /// Always `false` for a constructed sequence; provided for `len_without_is_empty`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Return the feature dimension.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Consume and return the flat row-major buffer.
    #[must_use]
    pub fn into_inner(self) -> Vec<f64> {
        self.values
    }
}

impl AsRef<[f64]> for FeatureSequence {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

/// Borrowed, validated view into a feature sequence.
#[derive(Debug, Clone, Copy)]
pub struct FeatureSequenceView<'a> {
    values: &'a [f64],
    dim: usize,
}

impl<'a> FeatureSequenceView<'a> {
    /// Create a view over a row-major buffer, validating it.
    ///
    /// # Errors
    ///
    /// Same conditions as [`FeatureSequence::new`].
    pub fn new(values: &'a [f64], dim: usize) -> Result<Self, AlignError> {
        validate(values, dim)?;
        Ok(Self { values, dim })
    }

    pub(crate) fn new_unchecked(values: &'a [f64], dim: usize) -> Self {
        Self { values, dim }
    }

    /// Return the underlying flat buffer.
    #[must_use]
    pub fn as_slice(&self) -> &'a [f64] {
        self.values
    }

    /// Return the number of feature vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len() / self.dim
    }

    /// Always `false` for a validated view.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Return the feature dimension.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Return feature vector `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    #[inline]
    #[must_use]
    pub fn vector(&self, i: usize) -> &'a [f64] {
        &self.values[i * self.dim..(i + 1) * self.dim]
    }

    /// Iterate over the feature vectors in order.
    pub fn vectors(&self) -> impl ExactSizeIterator<Item = &'a [f64]> + 'a {
        self.values.chunks_exact(self.dim)
    }

    /// Halve the resolution by averaging adjacent pairs of vectors.
    ///
    /// A trailing odd vector is dropped. Returns `None` when fewer than two
    /// vectors remain to pair.
    #[must_use]
    pub fn coarsen(&self) -> Option<FeatureSequence> {
        let half = self.len() / 2;
        if half == 0 {
            return None;
        }
        let mut values = Vec::with_capacity(half * self.dim);
        for k in 0..half {
            let a = self.vector(2 * k);
            let b = self.vector(2 * k + 1);
            values.extend(a.iter().zip(b).map(|(x, y)| (x + y) * 0.5));
        }
        Some(FeatureSequence { values, dim: self.dim })
    }
}

impl AsRef<[f64]> for FeatureSequenceView<'_> {
    fn as_ref(&self) -> &[f64] {
        self.values
    }
}
