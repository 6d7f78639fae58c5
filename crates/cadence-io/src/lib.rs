//! File I/O, validation, and serialization for the cadence aligner.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{AlignmentJob, AlignmentName};
pub use error::IoError;
pub use reader::{FeatureReader, ManifestReader};
pub use writer::AlignmentWriter;
