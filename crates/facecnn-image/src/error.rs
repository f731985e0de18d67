use facecnn_tensor::TensorError;

/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when the data length does not match the image size.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when the image has no pixels.
    #[error("Image is empty ({width}x{height})")]
    EmptyImage {
        /// Width of the rejected image.
        width: usize,
        /// Height of the rejected image.
        height: usize,
    },

    /// Error when a pixel value cannot be cast to the requested type.
    #[error("Failed to cast image data")]
    CastError,

    /// Error coming from the underlying tensor.
    #[error(transparent)]
    TensorError(#[from] TensorError),
}
