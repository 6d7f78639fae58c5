//! Domain types for cadence-io.

use std::path::{Path, PathBuf};

use crate::IoError;

/// A validated alignment name, used for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlignmentName(String);

impl AlignmentName {
    /// Parse and validate an alignment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidAlignmentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidAlignmentName { name });
        }
        Ok(Self(name))
    }

    /// Return the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AlignmentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One reference/query pair listed in a batch manifest.
///
/// Paths are already resolved against the manifest's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentJob {
    /// Name used for the output artifact.
    pub name: AlignmentName,
    /// Feature CSV of the reference (audio) sequence.
    pub reference: PathBuf,
    /// Feature CSV of the query (text) sequence.
    pub query: PathBuf,
}

impl AlignmentJob {
    pub(crate) fn new(name: AlignmentName, base: &Path, reference: &str, query: &str) -> Self {
        Self {
            name,
            reference: base.join(reference),
            query: base.join(query),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_name_valid() {
        let name = AlignmentName::new("chapter-01_take2".to_string());
        assert!(name.is_ok());
        assert_eq!(name.unwrap().as_str(), "chapter-01_take2");
    }

    #[test]
    fn alignment_name_rejects_empty() {
        let name = AlignmentName::new(String::new());
        assert!(matches!(name, Err(IoError::InvalidAlignmentName { .. })));
    }

    #[test]
    fn alignment_name_rejects_path_separators() {
        let name = AlignmentName::new("../chapter".to_string());
        assert!(matches!(name, Err(IoError::InvalidAlignmentName { .. })));
    }

    #[test]
    fn job_paths_resolve_against_base() {
        let name = AlignmentName::new("ch1".to_string()).unwrap();
        let job = AlignmentJob::new(name, Path::new("/data/book"), "audio/ch1.csv", "/abs/text.csv");
        assert_eq!(job.reference, PathBuf::from("/data/book/audio/ch1.csv"));
        // absolute paths replace the base
        assert_eq!(job.query, PathBuf::from("/abs/text.csv"));
    }
}
