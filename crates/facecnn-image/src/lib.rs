#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// image representation for the classifier input.
pub mod image;

/// Error types for the image module.
pub mod error;

/// operations to turn decoded images into normalized tensors.
pub mod normalize;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageSize};
