//! CSV dataset reader with full input validation.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use arbor_cart::Dataset;
use tracing::{debug, info, instrument};

use crate::IoError;

/// Reads a labelled feature table from a CSV file.
///
/// Expected CSV format:
/// - Header row required: feature names followed by the label column name
/// - `f0,f1,...,fn,label`
/// - Every column but the last is a finite float, the last is a class label
///
/// Class labels are numbered in order of first appearance and sample indices
/// are zero-based data row positions.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingLabelColumn`] | Header has fewer than two columns |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Feature cell is NaN, Inf, or unparseable float |
/// | [`IoError::EmptyLabel`] | Label cell is blank |
pub struct DatasetReader {
    path: PathBuf,
}

impl DatasetReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file, returning a [`Dataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Dataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;
        Self::from_reader(file, &self.path)
    }

    /// Parse CSV from any reader. `origin` only labels errors and logs.
    pub fn from_reader<R: Read>(reader: R, origin: &Path) -> Result<Dataset, IoError> {
        let path = || origin.to_path_buf();

        // flexible(true) so that InconsistentRowLength fires instead of a CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let header = rdr.headers().map_err(|e| IoError::CsvParse {
            path: path(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        })?;
        let expected_cols = header.len();
        if expected_cols < 2 {
            return Err(IoError::MissingLabelColumn {
                path: path(),
                columns: expected_cols,
            });
        }
        let n_features = expected_cols - 1;
        let feature_names: Vec<String> = header.iter().take(n_features).map(str::to_owned).collect();
        debug!(expected_cols, "read CSV header");

        let mut target_names: Vec<String> = Vec::new();
        let mut label_ids: HashMap<String, usize> = HashMap::new();
        let mut rows = Vec::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| IoError::CsvParse {
                path: path(),
                offset: e.position().map_or(0, |p| p.byte()),
                source: e,
            })?;

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: path(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            let mut features = Vec::with_capacity(n_features);
            for (col_index, raw) in record.iter().take(n_features).enumerate() {
                let value = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| IoError::NonFiniteValue {
                        path: path(),
                        row_index,
                        col_index,
                        raw: raw.to_string(),
                    })?;
                features.push(value);
            }

            let label = record.get(n_features).unwrap_or("");
            if label.is_empty() {
                return Err(IoError::EmptyLabel {
                    path: path(),
                    row_index,
                });
            }
            let target = match label_ids.get(label) {
                Some(&id) => id,
                None => {
                    let id = target_names.len();
                    target_names.push(label.to_owned());
                    label_ids.insert(label.to_owned(), id);
                    id
                }
            };

            rows.push((features, target));
        }

        if rows.is_empty() {
            return Err(IoError::EmptyDataset { path: path() });
        }

        let n_rows = rows.len();
        let dataset = Dataset::from_rows(feature_names, target_names, rows).map_err(|e| {
            IoError::InvalidDataset {
                path: path(),
                source: e,
            }
        })?;

        info!(
            n_samples = n_rows,
            n_features = dataset.n_features(),
            n_classes = dataset.n_classes(),
            "dataset loaded"
        );
        Ok(dataset)
    }
}
