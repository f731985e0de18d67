//! The seven layers of the network.
//!
//! Every layer comes in two flavours with the same contract: a plain version running on the
//! calling thread and a `_par` version distributing disjoint output regions over the rayon
//! thread pool. Layers that take their input by value transform it in place and hand it
//! back; layers that borrow their input return a new tensor.

/// 3x3 convolution.
pub mod conv;

/// Per-channel standardization.
pub mod batch_norm;

/// Rectified linear activation.
pub mod activation;

/// Non-overlapping max pooling.
pub mod pooling;

/// Feature map to vector reshape.
pub mod flatten;

/// Fully-connected projection.
pub mod linear;

/// Probability normalization.
pub mod softmax;
