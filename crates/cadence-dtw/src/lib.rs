//! Boundary-aware banded dynamic time warping (DTWBD).
//!
//! Pure math library, zero I/O. Aligns a long reference sequence of feature
//! vectors (audio frames) against a shorter query sequence (text fragments)
//! inside a diagonal band, with a skip transition that marks query elements
//! as having no reference counterpart.

#![warn(missing_docs)]

mod band;
mod cost;
mod engine;
mod error;
mod matrix;
mod path;
pub mod raw;
mod sequence;

pub use band::Band;
pub use cost::{AlignmentCost, Boundary, Metric};
pub use engine::{Aligner, Alignment};
pub use error::{AlignError, ErrorCode};
pub use path::{AlignmentPath, AlignmentStep, Transition};
pub use sequence::{FeatureSequence, FeatureSequenceView};
