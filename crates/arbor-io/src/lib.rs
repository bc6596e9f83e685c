//! Dataset loading, the bundled Iris data, and JSON artifacts for arbor.

mod domain;
mod error;
mod iris;
mod reader;
mod writer;

pub use domain::ExperimentName;
pub use error::IoError;
pub use iris::iris;
pub use reader::DatasetReader;
pub use writer::ResultWriter;
