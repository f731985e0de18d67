//! Trained parameters of the convolution and fully-connected layers.
//!
//! The flat weight arrays produced by training are wrapped in tensors so that the layout
//! formulas are enforced once, here, instead of at every call site:
//!
//! * convolution weights have shape `(out_channels, in_channels, 3, 3)`, i.e. the flat index
//!   is `f * in_channels * 9 + c * 9 + kr * 3 + kc`;
//! * fully-connected weights have shape `(out_features, in_features)`, i.e. the flat index
//!   is `o * in_features + i`.

use facecnn_tensor::{Tensor1, Tensor2, Tensor4};

use crate::{error::NnError, layers::conv::conv_output_dim};

/// Side of the square convolution kernel.
pub const KERNEL_SIZE: usize = 3;

/// Number of weights in a single-channel kernel.
pub const KERNEL_AREA: usize = KERNEL_SIZE * KERNEL_SIZE;

/// Parameters of a 3x3 convolution layer.
///
/// # Example
///
/// ```
/// use facecnn_nn::param::ConvParam;
///
/// // 2 input channels, 1 output channel, every weight 1.0
/// let p = ConvParam::new(2, 1, true, 1, vec![1.0; 18], vec![0.5]).unwrap();
/// assert_eq!(p.kernel(0, 1).len(), 9);
/// assert_eq!(p.output_dim(6), Some(6));
///
/// // the weight array must hold out * in * 9 values
/// assert!(ConvParam::new(2, 1, true, 1, vec![1.0; 17], vec![0.5]).is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawConvParam", into = "RawConvParam")
)]
pub struct ConvParam {
    in_channels: usize,
    out_channels: usize,
    pad: bool,
    stride: usize,
    weight: Tensor4<f32>,
    bias: Tensor1<f32>,
}

impl ConvParam {
    /// Create the parameters of a convolution layer from the flat trained arrays.
    ///
    /// # Arguments
    ///
    /// * `in_channels` - Number of channels of the input tensor.
    /// * `out_channels` - Number of filters, i.e. channels of the output tensor.
    /// * `pad` - Whether the input is zero-padded by one element on every spatial edge.
    /// * `stride` - Step between two kernel placements.
    /// * `weight` - `out_channels * in_channels * 9` weights.
    /// * `bias` - `out_channels` biases.
    ///
    /// # Errors
    ///
    /// Returns [`NnError::ShapeMismatch`] if the array lengths disagree with the channel
    /// counts, and [`NnError::InvalidParameter`] for a zero stride or channel count.
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        pad: bool,
        stride: usize,
        weight: Vec<f32>,
        bias: Vec<f32>,
    ) -> Result<Self, NnError> {
        if stride == 0 {
            return Err(NnError::invalid_parameter("conv", "stride must be > 0"));
        }
        if in_channels == 0 || out_channels == 0 {
            return Err(NnError::invalid_parameter(
                "conv",
                format!("channel counts must be > 0, got in={in_channels} out={out_channels}"),
            ));
        }

        let expected = out_channels * in_channels * KERNEL_AREA;
        if weight.len() != expected {
            return Err(NnError::shape_mismatch("conv weight", expected, weight.len()));
        }
        if bias.len() != out_channels {
            return Err(NnError::shape_mismatch("conv bias", out_channels, bias.len()));
        }

        Ok(Self {
            in_channels,
            out_channels,
            pad,
            stride,
            weight: Tensor4::from_shape_vec(
                [out_channels, in_channels, KERNEL_SIZE, KERNEL_SIZE],
                weight,
            )?,
            bias: Tensor1::from_shape_vec([out_channels], bias)?,
        })
    }

    /// Number of channels the layer consumes.
    #[inline]
    pub fn in_channels(&self) -> usize {
        self.in_channels
    }

    /// Number of channels the layer produces.
    #[inline]
    pub fn out_channels(&self) -> usize {
        self.out_channels
    }

    /// Whether the input is zero-padded before the convolution.
    #[inline]
    pub fn pad(&self) -> bool {
        self.pad
    }

    /// Step between two kernel placements.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Total number of elements added to each spatial dimension by padding.
    #[inline]
    pub fn pad_amount(&self) -> usize {
        if self.pad {
            2
        } else {
            0
        }
    }

    /// Output spatial dimension for an unpadded input dimension.
    ///
    /// `floor((input_dim - 3 + pad_amount) / stride) + 1`, or `None` when the (padded) input
    /// is smaller than the kernel.
    pub fn output_dim(&self, input_dim: usize) -> Option<usize> {
        conv_output_dim(input_dim, self.pad_amount(), self.stride)
    }

    /// The weights as a `(out_channels, in_channels, 3, 3)` tensor.
    #[inline]
    pub fn weight(&self) -> &Tensor4<f32> {
        &self.weight
    }

    /// The biases, one per output channel.
    #[inline]
    pub fn bias(&self) -> &[f32] {
        self.bias.as_slice()
    }

    /// Weight of filter `f`, input channel `c`, kernel row `kr`, kernel column `kc`.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of bounds.
    #[inline]
    pub fn weight_at(&self, f: usize, c: usize, kr: usize, kc: usize) -> f32 {
        *self.weight.get_unchecked([f, c, kr, kc])
    }

    /// The 9 row-major weights filter `f` applies to input channel `c`.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of bounds.
    #[inline]
    pub fn kernel(&self, f: usize, c: usize) -> &[f32] {
        let offset = self.weight.get_iter_offset_unchecked([f, c, 0, 0]);
        &self.weight.as_slice()[offset..offset + KERNEL_AREA]
    }
}

/// Parameters of a fully-connected layer.
///
/// # Example
///
/// ```
/// use facecnn_nn::param::FcParam;
///
/// let p = FcParam::new(3, 2, vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6], vec![0.1, 0.2]).unwrap();
/// assert_eq!(p.row(1), &[0.4, 0.5, 0.6]);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawFcParam", into = "RawFcParam")
)]
pub struct FcParam {
    in_features: usize,
    out_features: usize,
    weight: Tensor2<f32>,
    bias: Tensor1<f32>,
}

impl FcParam {
    /// Create the parameters of a fully-connected layer from the flat trained arrays.
    ///
    /// # Errors
    ///
    /// Returns [`NnError::ShapeMismatch`] if `weight` does not hold
    /// `out_features * in_features` values or `bias` does not hold `out_features` values.
    pub fn new(
        in_features: usize,
        out_features: usize,
        weight: Vec<f32>,
        bias: Vec<f32>,
    ) -> Result<Self, NnError> {
        if in_features == 0 || out_features == 0 {
            return Err(NnError::invalid_parameter(
                "fc",
                format!("feature counts must be > 0, got in={in_features} out={out_features}"),
            ));
        }

        let expected = out_features * in_features;
        if weight.len() != expected {
            return Err(NnError::shape_mismatch("fc weight", expected, weight.len()));
        }
        if bias.len() != out_features {
            return Err(NnError::shape_mismatch("fc bias", out_features, bias.len()));
        }

        Ok(Self {
            in_features,
            out_features,
            weight: Tensor2::from_shape_vec([out_features, in_features], weight)?,
            bias: Tensor1::from_shape_vec([out_features], bias)?,
        })
    }

    /// Length of the input vector.
    #[inline]
    pub fn in_features(&self) -> usize {
        self.in_features
    }

    /// Length of the output vector.
    #[inline]
    pub fn out_features(&self) -> usize {
        self.out_features
    }

    /// The weights as an `(out_features, in_features)` tensor.
    #[inline]
    pub fn weight(&self) -> &Tensor2<f32> {
        &self.weight
    }

    /// The biases, one per output feature.
    #[inline]
    pub fn bias(&self) -> &[f32] {
        self.bias.as_slice()
    }

    /// The `in_features` weights producing output `o`.
    ///
    /// # Panics
    ///
    /// Panics if `o` is out of bounds.
    #[inline]
    pub fn row(&self, o: usize) -> &[f32] {
        let len = self.in_features;
        &self.weight.as_slice()[o * len..(o + 1) * len]
    }
}

/// On-disk form of [`ConvParam`], field names as in the trained model export.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawConvParam {
    in_channels: usize,
    out_channels: usize,
    pad: bool,
    stride: usize,
    weight: Vec<f32>,
    bias: Vec<f32>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawConvParam> for ConvParam {
    type Error = NnError;

    fn try_from(raw: RawConvParam) -> Result<Self, Self::Error> {
        ConvParam::new(
            raw.in_channels,
            raw.out_channels,
            raw.pad,
            raw.stride,
            raw.weight,
            raw.bias,
        )
    }
}

#[cfg(feature = "serde")]
impl From<ConvParam> for RawConvParam {
    fn from(p: ConvParam) -> Self {
        Self {
            in_channels: p.in_channels,
            out_channels: p.out_channels,
            pad: p.pad,
            stride: p.stride,
            weight: p.weight.into_vec(),
            bias: p.bias.into_vec(),
        }
    }
}

/// On-disk form of [`FcParam`].
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawFcParam {
    in_features: usize,
    out_features: usize,
    weight: Vec<f32>,
    bias: Vec<f32>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawFcParam> for FcParam {
    type Error = NnError;

    fn try_from(raw: RawFcParam) -> Result<Self, Self::Error> {
        FcParam::new(raw.in_features, raw.out_features, raw.weight, raw.bias)
    }
}

#[cfg(feature = "serde")]
impl From<FcParam> for RawFcParam {
    fn from(p: FcParam) -> Self {
        Self {
            in_features: p.in_features,
            out_features: p.out_features,
            weight: p.weight.into_vec(),
            bias: p.bias.into_vec(),
        }
    }
}
