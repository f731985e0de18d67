use std::{
    fmt,
    time::{Duration, Instant},
};

use facecnn_image::Image;
use facecnn_tensor::{Tensor1, Tensor3};

use crate::{
    config::{NetworkConfig, NUM_BLOCKS},
    error::NnError,
    ops::LayerOps,
    parallel::ExecutionStrategy,
    param::ConvParam,
};

/// Side of the max pooling window after blocks 1 and 2.
pub const POOL_WINDOW: usize = 2;

/// One stage of the forward pass, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Image to normalized tensor.
    ToTensor,
    /// Convolution, batch norm, ReLU and 2x2 max pooling.
    Block1,
    /// Convolution, batch norm, ReLU and 2x2 max pooling.
    Block2,
    /// Convolution, batch norm and ReLU.
    Block3,
    /// Feature map to vector.
    Flatten,
    /// Fully-connected projection.
    FullyConnected,
    /// Scores to probabilities.
    Softmax,
}

impl Stage {
    /// The convolution block stages, in order.
    pub const BLOCKS: [Stage; NUM_BLOCKS] = [Stage::Block1, Stage::Block2, Stage::Block3];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ToTensor => "to tensor",
            Stage::Block1 => "block 1",
            Stage::Block2 => "block 2",
            Stage::Block3 => "block 3",
            Stage::Flatten => "flatten",
            Stage::FullyConnected => "fully connected",
            Stage::Softmax => "softmax",
        };
        f.write_str(name)
    }
}

/// Wall-clock time spent in one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTiming {
    /// The stage that was measured.
    pub stage: Stage,
    /// Time between the start and the completion of the stage.
    pub elapsed: Duration,
}

/// The class probabilities of one image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Likelihood that the image is background.
    pub background: f32,
    /// Likelihood that the image is a face.
    pub face: f32,
}

impl Prediction {
    /// The probabilities as `[background, face]`.
    pub fn probabilities(&self) -> [f32; 2] {
        [self.background, self.face]
    }

    /// Whether the face class is the more likely one.
    pub fn is_face(&self) -> bool {
        self.face > self.background
    }

    /// Whether both probabilities are finite.
    ///
    /// A degenerate batch norm channel or an overflowing softmax makes them NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.background.is_finite() && self.face.is_finite()
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bg: {} face: {}", self.background, self.face)
    }
}

impl TryFrom<Tensor1<f32>> for Prediction {
    type Error = NnError;

    fn try_from(probs: Tensor1<f32>) -> Result<Self, Self::Error> {
        match probs.as_slice() {
            &[background, face] => Ok(Self { background, face }),
            other => Err(NnError::shape_mismatch("prediction", 2, other.len())),
        }
    }
}

/// A prediction together with the time spent in every stage.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceReport {
    /// The class probabilities.
    pub prediction: Prediction,
    /// One entry per stage, in execution order.
    pub timings: Vec<StageTiming>,
}

impl InferenceReport {
    /// Sum of the stage timings.
    pub fn total(&self) -> Duration {
        self.timings.iter().map(|t| t.elapsed).sum()
    }
}

/// The three-block face/background classifier.
///
/// ```text
/// image -> tensor
///       -> conv -> batch norm -> relu -> max pool 2x2
///       -> conv -> batch norm -> relu -> max pool 2x2
///       -> conv -> batch norm -> relu
///       -> flatten -> fully connected -> softmax -> [background, face]
/// ```
///
/// The layer implementation is picked once, at construction. The classifier only reads its
/// configuration, so a single instance can serve concurrent calls; every call owns its
/// intermediate tensors.
pub struct FaceClassifier {
    config: NetworkConfig,
    ops: Box<dyn LayerOps>,
}

impl FaceClassifier {
    /// Create a classifier running the layers with the given strategy.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is inconsistent or the strategy cannot be resolved.
    pub fn new(config: NetworkConfig, strategy: ExecutionStrategy) -> Result<Self, NnError> {
        Self::with_ops(config, strategy.build()?)
    }

    /// Create a classifier running the layers with a custom implementation.
    pub fn with_ops(config: NetworkConfig, ops: Box<dyn LayerOps>) -> Result<Self, NnError> {
        config.validate()?;
        Ok(Self { config, ops })
    }

    /// Name of the layer implementation in use.
    pub fn strategy_name(&self) -> &'static str {
        self.ops.name()
    }

    /// The trained parameters.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Score a decoded BGR image.
    ///
    /// # Errors
    ///
    /// Returns [`NnError::InvalidImage`] for an empty image and [`NnError::ShapeMismatch`]
    /// if the image size would not flatten to the classifier's `in_features`, i.e. it differs
    /// from the one the network was trained on. The size is checked before any block runs.
    ///
    /// Numeric degeneracy is not an error; check [`Prediction::is_finite`].
    pub fn forward(&self, image: &Image<u8, 3>) -> Result<Prediction, NnError> {
        self.run(image, |_, _| {})
    }

    /// Score a decoded BGR image and measure every stage.
    ///
    /// # Errors
    ///
    /// Same as [`FaceClassifier::forward`].
    pub fn forward_timed(&self, image: &Image<u8, 3>) -> Result<InferenceReport, NnError> {
        let mut timings = Vec::with_capacity(7);
        let prediction = self.run(image, |stage, elapsed| {
            timings.push(StageTiming { stage, elapsed })
        })?;
        Ok(InferenceReport {
            prediction,
            timings,
        })
    }

    fn run(
        &self,
        image: &Image<u8, 3>,
        mut on_stage: impl FnMut(Stage, Duration),
    ) -> Result<Prediction, NnError> {
        let ops = self.ops.as_ref();

        let mut stage = |s: Stage, start: Instant| {
            let elapsed = start.elapsed();
            log::debug!("{}: {s} took {elapsed:?}", ops.name());
            on_stage(s, elapsed);
        };

        let start = Instant::now();
        let mut x = ops.to_tensor(image)?;
        stage(Stage::ToTensor, start);
        log::trace!("input tensor {:?}", x.shape);
        self.check_input_size(x.rows(), x.cols())?;

        for (i, (conv, s)) in self.config.conv().iter().zip(Stage::BLOCKS).enumerate() {
            let start = Instant::now();
            let pool = (i + 1 < NUM_BLOCKS).then_some(POOL_WINDOW);
            x = block(ops, x, conv, pool)?;
            stage(s, start);
            log::trace!("{s} output {:?}", x.shape);
        }

        let start = Instant::now();
        let v = ops.flatten(x)?;
        stage(Stage::Flatten, start);

        let start = Instant::now();
        let scores = ops.linear(&v, self.config.fc())?;
        stage(Stage::FullyConnected, start);
        log::trace!("scores {:?}", scores.as_slice());

        let start = Instant::now();
        let probs = ops.softmax(scores);
        stage(Stage::Softmax, start);

        let prediction = Prediction::try_from(probs)?;
        if !prediction.is_finite() {
            log::warn!("non-finite prediction: {prediction}");
        }
        Ok(prediction)
    }

    /// Rejects an input whose flattened block 3 output would not match the classifier.
    fn check_input_size(&self, rows: usize, cols: usize) -> Result<(), NnError> {
        let in_features = self.config.fc().in_features();
        match self.config.flattened_len(rows, cols, POOL_WINDOW) {
            Some(len) if len == in_features => Ok(()),
            len => Err(NnError::ShapeMismatch {
                layer: "input",
                expected: format!("{in_features} flattened features"),
                actual: match len {
                    Some(len) => format!("{len} flattened features from a {rows}x{cols} image"),
                    None => format!("a {rows}x{cols} image, too small for {NUM_BLOCKS} blocks"),
                },
            }),
        }
    }
}

impl fmt::Debug for FaceClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaceClassifier")
            .field("strategy", &self.ops.name())
            .field("config", &self.config)
            .finish()
    }
}

/// conv -> batch norm -> relu, followed by max pooling when a window is given.
fn block(
    ops: &dyn LayerOps,
    x: Tensor3<f32>,
    conv: &ConvParam,
    pool: Option<usize>,
) -> Result<Tensor3<f32>, NnError> {
    let x = ops.convolve(&x, conv)?;
    let x = ops.batch_norm(x)?;
    let x = ops.relu(x);
    match pool {
        Some(window) => ops.max_pool(&x, window),
        None => Ok(x),
    }
}
