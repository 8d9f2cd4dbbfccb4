use thiserror::Error;

/// Failure while fetching or decoding the classifier weights.
///
/// The detector degrades to demo mode on any of these; they are never fatal.
#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("Download error: {0}")]
    Download(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record error: {0}")]
    Record(String),

    #[error("Loader task error: {0}")]
    Task(String),
}

/// Failure while preprocessing an image or running the classifier.
///
/// Handled per call by falling back to the randomized demo result.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("Model returned an empty probability vector")]
    EmptyOutput,

    #[error("Tensor data error: {0}")]
    TensorData(String),

    #[error("Prediction error: {0}")]
    Prediction(String),
}

pub type LoadResult<T> = std::result::Result<T, ModelLoadError>;
pub type Result<T> = std::result::Result<T, InferenceError>;
