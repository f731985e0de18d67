use facecnn_image::{
    normalize::{bgr_to_rgb_planar, bgr_to_rgb_planar_par, ScaleMode},
    Image,
};
use facecnn_tensor::{Tensor1, Tensor3};

use crate::{
    error::NnError,
    layers::{activation, batch_norm, conv, flatten, linear, pooling, softmax},
    param::{ConvParam, FcParam},
};

/// The capability set one execution strategy provides to the pipeline.
///
/// Every operation is synchronous: when it returns, its whole output is written. Operations
/// taking a tensor by value transform it in place; the caller must not expect to reuse it.
///
/// Implementations must produce the same results up to floating point summation order.
pub trait LayerOps: Send + Sync {
    /// Short name of the strategy, e.g. `"reference"`.
    fn name(&self) -> &'static str;

    /// Convert a decoded BGR image into an RGB `(3, H, W)` tensor with values in `[0, 1]`.
    fn to_tensor(&self, image: &Image<u8, 3>) -> Result<Tensor3<f32>, NnError>;

    /// 3x3 convolution, see [`conv::conv2d_3x3`].
    fn convolve(&self, src: &Tensor3<f32>, param: &ConvParam) -> Result<Tensor3<f32>, NnError>;

    /// Per-channel standardization, see [`batch_norm::batch_norm`].
    fn batch_norm(&self, src: Tensor3<f32>) -> Result<Tensor3<f32>, NnError>;

    /// Rectification, see [`activation::relu`].
    fn relu(&self, src: Tensor3<f32>) -> Tensor3<f32>;

    /// Non-overlapping max pooling, see [`pooling::max_pool2d`].
    fn max_pool(&self, src: &Tensor3<f32>, window: usize) -> Result<Tensor3<f32>, NnError>;

    /// Row-major linearization, see [`flatten::flatten`].
    fn flatten(&self, src: Tensor3<f32>) -> Result<Tensor1<f32>, NnError> {
        flatten::flatten(src)
    }

    /// Fully-connected projection, see [`linear::linear`].
    fn linear(&self, src: &Tensor1<f32>, param: &FcParam) -> Result<Tensor1<f32>, NnError>;

    /// Probability normalization, see [`softmax::softmax`].
    fn softmax(&self, src: Tensor1<f32>) -> Tensor1<f32> {
        softmax::softmax(src)
    }
}

/// Straightforward loops on the calling thread.
///
/// The image is scaled as a whole buffer before its channels are rearranged.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceOps;

impl LayerOps for ReferenceOps {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn to_tensor(&self, image: &Image<u8, 3>) -> Result<Tensor3<f32>, NnError> {
        Ok(bgr_to_rgb_planar(image, ScaleMode::Buffer)?)
    }

    fn convolve(&self, src: &Tensor3<f32>, param: &ConvParam) -> Result<Tensor3<f32>, NnError> {
        conv::conv2d_3x3(src, param)
    }

    fn batch_norm(&self, src: Tensor3<f32>) -> Result<Tensor3<f32>, NnError> {
        batch_norm::batch_norm(src)
    }

    fn relu(&self, src: Tensor3<f32>) -> Tensor3<f32> {
        activation::relu(src)
    }

    fn max_pool(&self, src: &Tensor3<f32>, window: usize) -> Result<Tensor3<f32>, NnError> {
        pooling::max_pool2d(src, window)
    }

    fn linear(&self, src: &Tensor1<f32>, param: &FcParam) -> Result<Tensor1<f32>, NnError> {
        linear::linear(src, param)
    }
}

/// Data-parallel loops over disjoint output regions, on rayon.
///
/// Runs on the global rayon pool, or on a dedicated pool built once by
/// [`ParallelOps::with_threads`]. The image is scaled sample by sample at read time.
#[derive(Debug, Default)]
pub struct ParallelOps {
    pool: Option<rayon::ThreadPool>,
}

impl ParallelOps {
    /// Run on the global rayon thread pool.
    pub fn new() -> Self {
        Self { pool: None }
    }

    /// Run on a dedicated pool of `num_threads` workers.
    ///
    /// # Errors
    ///
    /// Returns [`NnError::InvalidParameter`] if `num_threads` is zero and
    /// [`NnError::ThreadPool`] if the pool cannot be built.
    pub fn with_threads(num_threads: usize) -> Result<Self, NnError> {
        if num_threads == 0 {
            return Err(NnError::invalid_parameter(
                "thread_pool",
                "thread count must be > 0",
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .map_err(|e| NnError::ThreadPool(e.to_string()))?;

        Ok(Self { pool: Some(pool) })
    }

    /// Number of workers the layers are distributed over.
    pub fn num_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

impl LayerOps for ParallelOps {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn to_tensor(&self, image: &Image<u8, 3>) -> Result<Tensor3<f32>, NnError> {
        Ok(self.install(|| bgr_to_rgb_planar_par(image, ScaleMode::Sample))?)
    }

    fn convolve(&self, src: &Tensor3<f32>, param: &ConvParam) -> Result<Tensor3<f32>, NnError> {
        self.install(|| conv::conv2d_3x3_par(src, param))
    }

    fn batch_norm(&self, src: Tensor3<f32>) -> Result<Tensor3<f32>, NnError> {
        self.install(|| batch_norm::batch_norm_par(src))
    }

    fn relu(&self, src: Tensor3<f32>) -> Tensor3<f32> {
        self.install(|| activation::relu_par(src))
    }

    fn max_pool(&self, src: &Tensor3<f32>, window: usize) -> Result<Tensor3<f32>, NnError> {
        self.install(|| pooling::max_pool2d_par(src, window))
    }

    fn linear(&self, src: &Tensor1<f32>, param: &FcParam) -> Result<Tensor1<f32>, NnError> {
        self.install(|| linear::linear_par(src, param))
    }
}
