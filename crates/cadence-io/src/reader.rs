//! CSV readers for feature sequences and batch manifests.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use cadence_dtw::FeatureSequence;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{AlignmentJob, AlignmentName};

const MANIFEST_HEADER: [&str; 3] = ["name", "reference", "query"];

fn open_csv(path: &Path) -> Result<csv::Reader<File>, IoError> {
    let file = File::open(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    // flexible(true) so that our own InconsistentRowLength check fires
    // instead of a low-level CsvParse error.
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file))
}

fn csv_error(path: &Path, e: csv::Error) -> IoError {
    IoError::CsvParse {
        path: path.to_path_buf(),
        offset: e.position().map_or(0, |p| p.byte()),
        source: e,
    }
}

/// Reads a feature sequence from a CSV file.
///
/// Expected CSV format:
/// - Header row required (column names are ignored, only their count matters)
/// - One feature vector per row, in sequence order
/// - All rows must have the same number of columns
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
pub struct FeatureReader {
    path: PathBuf,
}

impl FeatureReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file, returning a [`FeatureSequence`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<FeatureSequence, IoError> {
        let mut rdr = open_csv(&self.path)?;

        let expected_cols = rdr.headers().map_err(|e| csv_error(&self.path, e))?.len();
        debug!(expected_cols, "read CSV header");

        let mut values = Vec::new();
        let mut n_rows = 0usize;

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| csv_error(&self.path, e))?;

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            for (col_index, raw) in record.iter().enumerate() {
                let non_finite = || IoError::NonFiniteValue {
                    path: self.path.clone(),
                    row_index,
                    col_index,
                    raw: raw.to_string(),
                };
                let value: f64 = raw.parse().map_err(|_| non_finite())?;
                if !value.is_finite() {
                    return Err(non_finite());
                }
                values.push(value);
            }
            n_rows += 1;
        }

        if n_rows == 0 {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let sequence = FeatureSequence::new(values, expected_cols)?;
        info!(n_vectors = sequence.len(), dim = sequence.dim(), "features loaded");
        Ok(sequence)
    }
}

/// Reads a batch manifest listing reference/query pairs.
///
/// Expected CSV format: header `name,reference,query`, one job per row.
/// Relative paths are resolved against the manifest's own directory.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | Manifest doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::ManifestHeader`] | Header is not `name,reference,query` |
/// | [`IoError::EmptyDataset`] | Zero jobs after header |
/// | [`IoError::InconsistentRowLength`] | Row does not have three columns |
/// | [`IoError::InvalidAlignmentName`] | Name outside `[a-zA-Z0-9_-]+` |
/// | [`IoError::DuplicateName`] | Same name appears twice |
pub struct ManifestReader {
    path: PathBuf,
}

impl ManifestReader {
    /// Create a new reader for the given manifest path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the manifest, returning its jobs in file order.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Vec<AlignmentJob>, IoError> {
        let mut rdr = open_csv(&self.path)?;

        let header = rdr.headers().map_err(|e| csv_error(&self.path, e))?;
        if !header.iter().eq(MANIFEST_HEADER) {
            return Err(IoError::ManifestHeader {
                path: self.path.clone(),
                got: header.iter().collect::<Vec<_>>().join(","),
            });
        }

        let base = self.path.parent().unwrap_or(Path::new(""));
        let mut jobs = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| csv_error(&self.path, e))?;
            let [Some(name), Some(reference), Some(query)] =
                [record.get(0), record.get(1), record.get(2)]
            else {
                return Err(self.bad_row(row_index, record.len()));
            };
            if record.len() != MANIFEST_HEADER.len() {
                return Err(self.bad_row(row_index, record.len()));
            }

            if let Some(&first_row) = seen.get(name) {
                return Err(IoError::DuplicateName {
                    path: self.path.clone(),
                    name: name.to_string(),
                    first_row,
                    second_row: row_index,
                });
            }
            seen.insert(name.to_string(), row_index);

            let name = AlignmentName::new(name.to_string())?;
            jobs.push(AlignmentJob::new(name, base, reference, query));
        }

        if jobs.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(n_jobs = jobs.len(), "manifest loaded");
        Ok(jobs)
    }

    fn bad_row(&self, row_index: usize, got: usize) -> IoError {
        IoError::InconsistentRowLength {
            path: self.path.clone(),
            row_index,
            expected: MANIFEST_HEADER.len(),
            got,
        }
    }
}
