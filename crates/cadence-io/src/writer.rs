//! JSON result writer for alignment outputs.

use std::fs;
use std::path::{Path, PathBuf};

use cadence_dtw::Alignment;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::AlignmentName;

/// Writes alignment results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{name}_alignment.json`.
pub struct AlignmentWriter {
    output_dir: PathBuf,
}

impl AlignmentWriter {
    /// Create a new writer targeting the given directory.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display()))]
    pub fn new(output_dir: &Path) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Return the path `write` uses for `name`.
    #[must_use]
    pub fn artifact_path(&self, name: &AlignmentName) -> PathBuf {
        self.output_dir.join(format!("{name}_alignment.json"))
    }

    /// Write an alignment to `{name}_alignment.json` and return its path.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Serialize`] | Artifact cannot be encoded |
    /// | [`IoError::WriteFile`] | File cannot be written |
    #[instrument(skip_all, fields(name = %name))]
    pub fn write(&self, name: &AlignmentName, alignment: &Alignment) -> Result<PathBuf, IoError> {
        let path = self.artifact_path(name);
        let artifact = AlignmentArtifact::new(name, alignment);

        let json = serde_json::to_string_pretty(&artifact).map_err(|e| IoError::Serialize {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), steps = artifact.path.len(), "alignment written");
        Ok(path)
    }
}

#[derive(Serialize)]
struct AlignmentArtifact<'a> {
    name: &'a str,
    distance: f64,
    n_reference: usize,
    n_query: usize,
    path: Vec<[usize; 2]>,
    skipped_queries: Vec<usize>,
    /// `[first, last]` reference frame per query element, `null` if skipped.
    query_spans: Vec<Option<[usize; 2]>>,
}

impl<'a> AlignmentArtifact<'a> {
    fn new(name: &'a AlignmentName, alignment: &Alignment) -> Self {
        let path = &alignment.path;
        Self {
            name: name.as_str(),
            distance: alignment.distance.value(),
            n_reference: path.n_reference(),
            n_query: path.n_query(),
            path: path.into_iter().map(|s| [s.reference, s.query]).collect(),
            skipped_queries: path.skipped_queries(),
            query_spans: path
                .query_spans()
                .into_iter()
                .map(|span| span.map(|r| [*r.start(), *r.end()]))
                .collect(),
        }
    }
}
