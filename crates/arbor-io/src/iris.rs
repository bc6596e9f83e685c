//! The bundled Iris dataset.

use std::path::Path;

use arbor_cart::Dataset;

use crate::{DatasetReader, IoError};

const IRIS_CSV: &str = include_str!("../data/iris.csv");

/// Load the bundled Iris dataset: 150 samples, 4 features, 3 classes
/// (setosa, versicolor, virginica; 50 each, in that row order).
///
/// # Errors
///
/// Only fails if the bundled file is corrupt.
pub fn iris() -> Result<Dataset, IoError> {
    DatasetReader::from_reader(IRIS_CSV.as_bytes(), Path::new("<bundled>/iris.csv"))
}
