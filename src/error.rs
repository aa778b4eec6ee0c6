use std::{
    error::Error,
    fmt::{self, Display},
    io,
    path::PathBuf,
};

use ndarray::ShapeError;

use crate::dataset::ImageShape;

/// The result type used in the entire pipeline.
pub type Result<T> = std::result::Result<T, PipelineErr>;

/// The pipeline's error type.
///
/// Every variant is an input-validation failure, none of them are transient.
#[derive(Debug)]
pub enum PipelineErr {
    /// A label is not a valid index into the dataset's class names.
    InvalidLabel { label: usize, num_classes: usize },
    /// An image, or a flattened vector, doesn't have the expected shape.
    InvalidShape { got: Vec<usize>, expected: ImageShape },
    /// The validation partition is larger than the dataset.
    InvalidSplit { validation: usize, total: usize },
    /// The configuration is inconsistent.
    InvalidConfig(String),
    /// A dataset file on disk doesn't follow the expected layout.
    CorruptSource { path: PathBuf, reason: String },
    Array(ShapeError),
    Io(io::Error),
    Json(serde_json::Error),
}

impl Display for PipelineErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineErr::InvalidLabel { label, num_classes } => write!(
                f,
                "invalid label {label}, expected a value in [0, {num_classes})"
            ),
            PipelineErr::InvalidShape { got, expected } => {
                write!(f, "invalid shape {got:?}, expected {expected}")
            }
            PipelineErr::InvalidSplit { validation, total } => write!(
                f,
                "invalid split, validation size {validation} exceeds the {total} available examples"
            ),
            PipelineErr::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            PipelineErr::CorruptSource { path, reason } => {
                write!(f, "corrupt dataset file {}: {reason}", path.display())
            }
            PipelineErr::Array(e) => write!(f, "array error: {e}"),
            PipelineErr::Io(e) => write!(f, "io error: {e}"),
            PipelineErr::Json(e) => write!(f, "json error: {e}"),
        }
    }
}

impl Error for PipelineErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineErr::Array(e) => Some(e),
            PipelineErr::Io(e) => Some(e),
            PipelineErr::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ShapeError> for PipelineErr {
    fn from(value: ShapeError) -> Self {
        Self::Array(value)
    }
}

impl From<io::Error> for PipelineErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for PipelineErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
