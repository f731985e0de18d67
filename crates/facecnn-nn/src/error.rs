use facecnn_image::ImageError;
use facecnn_tensor::TensorError;
use thiserror::Error;

/// An error type for the layer engine and the pipeline.
#[derive(Error, Debug)]
pub enum NnError {
    /// A parameter array or channel count disagrees with the tensor actually supplied.
    #[error("{layer}: shape mismatch, expected {expected} but got {actual}")]
    ShapeMismatch {
        /// Layer that rejected its input.
        layer: &'static str,
        /// What the layer expected.
        expected: String,
        /// What it was given.
        actual: String,
    },

    /// A layer parameter is outside its domain (zero stride, zero window, ...).
    #[error("{layer}: invalid parameter: {message}")]
    InvalidParameter {
        /// Layer owning the parameter.
        layer: &'static str,
        /// Description of the problem.
        message: String,
    },

    /// The decoded input image is empty or malformed.
    #[error("Invalid image: {0}")]
    InvalidImage(#[from] ImageError),

    /// Error coming from the underlying tensor.
    #[error(transparent)]
    TensorError(#[from] TensorError),

    /// The network configuration is inconsistent.
    #[error("Invalid network configuration: {0}")]
    Config(String),

    /// The execution strategy could not be parsed.
    #[error("Unknown execution strategy: {0}")]
    UnknownStrategy(String),

    /// The dedicated thread pool could not be built.
    #[error("Failed to build thread pool: {0}")]
    ThreadPool(String),

    /// Failed to read a weights file.
    #[cfg(feature = "serde")]
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Failed to parse a weights document.
    #[cfg(feature = "serde")]
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl NnError {
    /// Creates a ShapeMismatch error.
    pub fn shape_mismatch(
        layer: &'static str,
        expected: impl std::fmt::Debug,
        actual: impl std::fmt::Debug,
    ) -> Self {
        Self::ShapeMismatch {
            layer,
            expected: format!("{:?}", expected),
            actual: format!("{:?}", actual),
        }
    }

    /// Creates an InvalidParameter error.
    pub fn invalid_parameter(layer: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            layer,
            message: message.into(),
        }
    }
}
