#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! `facecnn-tensor` provides the owned, contiguous, row-major [`Tensor`] the layer engine
//! passes from one layer to the next. The shape and strides are carried next to the data so
//! that every multi-dimensional index is resolved in a single place
//! ([`Tensor::get_iter_offset`]) instead of being recomputed at each call site.
//!
//! Feature maps are three-dimensional tensors laid out as `(channels, rows, cols)`, and the
//! vectors produced after flattening are one-dimensional tensors.
//!
//! # Quick Start
//!
//! ```rust
//! use facecnn_tensor::{Tensor1, Tensor3};
//!
//! // a 2-channel 2x2 feature map
//! let t = Tensor3::<f32>::from_shape_vec([2, 2, 2], (0..8).map(|x| x as f32).collect()).unwrap();
//! assert_eq!(t.get([1, 0, 1]), Some(&5.0));
//! assert_eq!(t.channel(1), &[4.0, 5.0, 6.0, 7.0]);
//!
//! // flattening is a reshape and does not touch the data
//! let v: Tensor1<f32> = t.reshape([8]).unwrap();
//! assert_eq!(v.as_slice()[5], 5.0);
//! ```

/// Tensor module containing the main tensor implementation and error types.
pub mod tensor;

pub use crate::tensor::{get_strides_from_shape, Tensor, TensorError};

/// Type alias for a 1-dimensional tensor.
pub type Tensor1<T> = Tensor<T, 1>;

/// Type alias for a 2-dimensional tensor.
pub type Tensor2<T> = Tensor<T, 2>;

/// Type alias for a 3-dimensional tensor.
pub type Tensor3<T> = Tensor<T, 3>;

/// Type alias for a 4-dimensional tensor.
pub type Tensor4<T> = Tensor<T, 4>;
