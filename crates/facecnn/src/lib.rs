#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! Re-exports the workspace crates under short names:
//!
//! * [`tensor`] for the row-major tensor,
//! * [`image`] for decoded images and their normalization,
//! * [`nn`] for the layers and the face classifier.

#[doc(inline)]
pub use facecnn_tensor as tensor;

#[doc(inline)]
pub use facecnn_image as image;

#[doc(inline)]
pub use facecnn_nn as nn;
