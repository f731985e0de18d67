#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! The crate evaluates a fixed three-block convolutional network scoring an image as
//! background or face:
//!
//! * [`param`] and [`config`] hold the trained weights, wrapped in tensors so that the
//!   weight layout is resolved in one place.
//! * [`layers`] implements the seven layers, each in a sequential and a rayon flavour.
//! * [`ops::LayerOps`] groups one flavour of every layer behind a single trait;
//!   [`parallel::ExecutionStrategy`] picks the implementation once, at construction.
//! * [`pipeline::FaceClassifier`] wires the layers together and returns a
//!   [`pipeline::Prediction`].
//!
//! # Quick Start
//!
//! ```rust
//! use facecnn_image::{Image, ImageSize};
//! use facecnn_nn::{
//!     config::NetworkConfig,
//!     param::{ConvParam, FcParam},
//!     ExecutionStrategy, FaceClassifier,
//! };
//!
//! let conv = |i: usize, o: usize| {
//!     ConvParam::new(i, o, true, 1, vec![0.1; o * i * 9], vec![0.0; o]).unwrap()
//! };
//! // an 8x8 image is pooled twice down to 2x2, with 4 channels in the last block
//! let config = NetworkConfig::new(
//!     [conv(3, 4), conv(4, 4), conv(4, 4)],
//!     FcParam::new(16, 2, vec![0.01; 32], vec![0.0, 0.0]).unwrap(),
//! )
//! .unwrap();
//!
//! let model = FaceClassifier::new(config, ExecutionStrategy::Reference).unwrap();
//!
//! let data = (0..8 * 8 * 3).map(|i| (i % 256) as u8).collect();
//! let image = Image::<u8, 3>::new(ImageSize { width: 8, height: 8 }, data).unwrap();
//!
//! let prediction = model.forward(&image).unwrap();
//! assert!((prediction.background + prediction.face - 1.0).abs() < 1e-5);
//! ```

/// Trained network parameters and their validation.
pub mod config;

/// Error types for the layer engine.
pub mod error;

pub mod layers;

/// The layer implementations behind a common trait.
pub mod ops;

/// Selection of the execution strategy.
pub mod parallel;

pub mod param;

/// The three-block classifier.
pub mod pipeline;

pub use crate::config::NetworkConfig;
pub use crate::error::NnError;
pub use crate::ops::{LayerOps, ParallelOps, ReferenceOps};
pub use crate::parallel::ExecutionStrategy;
pub use crate::param::{ConvParam, FcParam};
pub use crate::pipeline::{FaceClassifier, InferenceReport, Prediction, Stage, StageTiming};
