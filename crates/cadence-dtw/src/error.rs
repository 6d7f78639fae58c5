//! Error types for feature validation and alignment.

/// Errors from feature sequence validation and DTWBD alignment.
///
/// Every variant has a stable negative status code, see [`AlignError::code`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlignError {
    /// Returned when a sequence contains no feature vectors.
    #[error("feature sequence must contain at least one vector")]
    EmptySequence,

    /// Returned when the reference and query vectors have different dimensions.
    #[error("dimension mismatch: reference has dimension {reference}, query has dimension {query}")]
    DimensionMismatch {
        /// Dimension of the reference vectors.
        reference: usize,
        /// Dimension of the query vectors.
        query: usize,
    },

    /// Returned when the band radius is negative.
    #[error("band radius must be non-negative, got {radius}")]
    InvalidRadius {
        /// The rejected radius.
        radius: i64,
    },

    /// Returned when the skip penalty is negative, NaN, or infinite.
    #[error("skip penalty must be finite and non-negative, got {penalty}")]
    InvalidPenalty {
        /// The rejected penalty.
        penalty: f64,
    },

    /// Returned when the terminal cell cannot be reached inside the band.
    #[error("terminal cell ({n_reference}-1, {n_query}-1) is unreachable with radius {radius}")]
    Infeasible {
        /// Reference length.
        n_reference: usize,
        /// Query length.
        n_query: usize,
        /// Radius the band was built with.
        radius: usize,
    },

    /// Returned when the caller's output buffer cannot hold the path.
    #[error("path of {needed} steps does not fit in a buffer of {capacity} pairs")]
    BufferTooSmall {
        /// Number of coordinate pairs in the path.
        needed: usize,
        /// Number of coordinate pairs the buffer can hold.
        capacity: usize,
    },

    /// Returned when the predecessor chain is broken. Indicates a bug, not bad input.
    #[error("predecessor chain corrupt after {steps} steps")]
    Corrupt {
        /// Steps walked before the violation was detected.
        steps: usize,
    },

    /// Returned when a feature dimension of zero is declared.
    #[error("feature dimension must be at least 1")]
    ZeroDimension,

    /// Returned when a flat buffer length is not a multiple of the feature dimension.
    #[error("buffer of {len} values is not a whole number of {dim}-dimensional vectors")]
    RaggedBuffer {
        /// Length of the flat buffer.
        len: usize,
        /// Declared feature dimension.
        dim: usize,
    },

    /// Returned when a feature value is NaN or infinite.
    #[error("feature sequence contains non-finite value at flat index {index}")]
    NonFiniteValue {
        /// Position of the first non-finite value in the flat buffer.
        index: usize,
    },

    /// Returned when a raw buffer's length disagrees with its declared vector count and dimension.
    #[error("buffer holds {len} values, expected {expected}")]
    ShapeMismatch {
        /// Length of the flat buffer.
        len: usize,
        /// Declared vector count times dimension.
        expected: usize,
    },
}

/// Stable status codes reported at the raw buffer boundary.
///
/// Values are fixed forever; new kinds get new codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum ErrorCode {
    /// [`AlignError::EmptySequence`].
    EmptySequence = -1,
    /// [`AlignError::DimensionMismatch`].
    DimensionMismatch = -2,
    /// [`AlignError::InvalidRadius`].
    InvalidRadius = -3,
    /// [`AlignError::InvalidPenalty`].
    InvalidPenalty = -4,
    /// [`AlignError::Infeasible`]. Retry with a wider radius.
    Infeasible = -5,
    /// [`AlignError::BufferTooSmall`].
    BufferTooSmall = -6,
    /// [`AlignError::Corrupt`]. An engine bug, never an input problem.
    Corrupt = -7,
    /// [`AlignError::ZeroDimension`].
    ZeroDimension = -8,
    /// [`AlignError::RaggedBuffer`].
    RaggedBuffer = -9,
    /// [`AlignError::NonFiniteValue`].
    NonFiniteValue = -10,
    /// [`AlignError::ShapeMismatch`]: a raw slice length is not `len * dim`.
    ShapeMismatch = -11,
}

impl ErrorCode {
    /// Every code, in numeric order from -1 downwards.
    pub const ALL: [Self; 11] = [
        Self::EmptySequence,
        Self::DimensionMismatch,
        Self::InvalidRadius,
        Self::InvalidPenalty,
        Self::Infeasible,
        Self::BufferTooSmall,
        Self::Corrupt,
        Self::ZeroDimension,
        Self::RaggedBuffer,
        Self::NonFiniteValue,
        Self::ShapeMismatch,
    ];

    /// Return the raw status value.
    #[must_use]
    pub fn value(self) -> isize {
        self as i8 as isize
    }

    /// Look up the code for a raw status value.
    #[must_use]
    pub fn from_value(value: isize) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.value() == value)
    }
}

impl AlignError {
    /// Return the stable status code for this error kind.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::EmptySequence => ErrorCode::EmptySequence,
            Self::DimensionMismatch { .. } => ErrorCode::DimensionMismatch,
            Self::InvalidRadius { .. } => ErrorCode::InvalidRadius,
            Self::InvalidPenalty { .. } => ErrorCode::InvalidPenalty,
            Self::Infeasible { .. } => ErrorCode::Infeasible,
            Self::BufferTooSmall { .. } => ErrorCode::BufferTooSmall,
            Self::Corrupt { .. } => ErrorCode::Corrupt,
            Self::ZeroDimension => ErrorCode::ZeroDimension,
            Self::RaggedBuffer { .. } => ErrorCode::RaggedBuffer,
            Self::NonFiniteValue { .. } => ErrorCode::NonFiniteValue,
            Self::ShapeMismatch { .. } => ErrorCode::ShapeMismatch,
        }
    }

    /// Return true for errors caused by the caller's inputs or configuration.
    ///
    /// `Infeasible` is excluded: it may succeed with a wider radius.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        !matches!(
            self,
            Self::Infeasible { .. } | Self::BufferTooSmall { .. } | Self::Corrupt { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_are_unique_and_negative() {
        let values: HashSet<isize> = ErrorCode::ALL.iter().map(|c| c.value()).collect();
        assert_eq!(values.len(), ErrorCode::ALL.len());
        assert!(values.iter().all(|&v| v < 0));
    }

    #[test]
    fn codes_are_pinned() {
        assert_eq!(ErrorCode::EmptySequence.value(), -1);
        assert_eq!(ErrorCode::DimensionMismatch.value(), -2);
        assert_eq!(ErrorCode::Infeasible.value(), -5);
        assert_eq!(ErrorCode::BufferTooSmall.value(), -6);
        assert_eq!(ErrorCode::NonFiniteValue.value(), -10);
    }

    #[test]
    fn from_value_inverts_value() {
        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::from_value(code.value()), Some(code));
        }
        assert_eq!(ErrorCode::from_value(0), None);
        assert_eq!(ErrorCode::from_value(-12), None);
    }

    #[test]
    fn error_maps_to_code() {
        let err = AlignError::Infeasible { n_reference: 4, n_query: 9, radius: 0 };
        assert_eq!(err.code(), ErrorCode::Infeasible);
        assert!(!err.is_input_error());

        let err = AlignError::InvalidPenalty { penalty: -1.0 };
        assert_eq!(err.code(), ErrorCode::InvalidPenalty);
        assert!(err.is_input_error());
    }

    #[test]
    fn every_code_names_one_variant() {
        let errors = [
            AlignError::EmptySequence,
            AlignError::DimensionMismatch { reference: 1, query: 2 },
            AlignError::InvalidRadius { radius: -1 },
            AlignError::InvalidPenalty { penalty: -1.0 },
            AlignError::Infeasible { n_reference: 1, n_query: 4, radius: 1 },
            AlignError::BufferTooSmall { needed: 2, capacity: 1 },
            AlignError::Corrupt { steps: 0 },
            AlignError::ZeroDimension,
            AlignError::RaggedBuffer { len: 3, dim: 2 },
            AlignError::NonFiniteValue { index: 0 },
            AlignError::ShapeMismatch { len: 3, expected: 2 },
        ];
        let codes: Vec<ErrorCode> = errors.iter().map(AlignError::code).collect();
        assert_eq!(codes, ErrorCode::ALL);
    }

    #[test]
    fn display_reports_index() {
        let err = AlignError::NonFiniteValue { index: 7 };
        assert_eq!(err.to_string(), "feature sequence contains non-finite value at flat index 7");
    }
}
