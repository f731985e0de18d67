use std::borrow::Cow;

use rayon::prelude::*;

use facecnn_tensor::Tensor3;

use crate::{
    error::NnError,
    param::{ConvParam, KERNEL_SIZE},
};

const LAYER: &str = "conv";

/// Output spatial dimension of a 3x3 convolution.
///
/// `floor((input_dim - 3 + pad_amount) / stride) + 1`, or `None` when the padded input is
/// smaller than the kernel or the stride is zero.
///
/// # Example
///
/// ```
/// use facecnn_nn::layers::conv::conv_output_dim;
///
/// assert_eq!(conv_output_dim(6, 2, 1), Some(6));
/// assert_eq!(conv_output_dim(6, 0, 1), Some(4));
/// assert_eq!(conv_output_dim(32, 2, 2), Some(16));
/// ```
pub fn conv_output_dim(input_dim: usize, pad_amount: usize, stride: usize) -> Option<usize> {
    let padded = input_dim + pad_amount;
    if stride == 0 || padded < KERNEL_SIZE {
        return None;
    }
    Some((padded - KERNEL_SIZE) / stride + 1)
}

/// Checks the input against the layer and returns the output `(rows, cols)`.
fn check_input(src: &Tensor3<f32>, param: &ConvParam) -> Result<(usize, usize), NnError> {
    if src.channels() != param.in_channels() {
        return Err(NnError::shape_mismatch(
            LAYER,
            param.in_channels(),
            src.channels(),
        ));
    }

    let pad = param.pad_amount();
    match (
        conv_output_dim(src.rows(), pad, param.stride()),
        conv_output_dim(src.cols(), pad, param.stride()),
    ) {
        (Some(rows), Some(cols)) => Ok((rows, cols)),
        _ => Err(NnError::shape_mismatch(
            LAYER,
            format!("spatial size >= {} after padding", KERNEL_SIZE),
            src.shape,
        )),
    }
}

/// Zero-pads every channel by one element on each spatial edge, or borrows the input as is.
fn padded_input<'a>(src: &'a Tensor3<f32>, param: &ConvParam) -> Cow<'a, Tensor3<f32>> {
    if !param.pad() {
        return Cow::Borrowed(src);
    }

    let (rows, cols) = (src.rows(), src.cols());
    Cow::Owned(Tensor3::from_shape_fn(
        [src.channels(), rows + 2, cols + 2],
        |[c, r, k]| {
            if r == 0 || k == 0 || r > rows || k > cols {
                0.0
            } else {
                *src.get_unchecked([c, r - 1, k - 1])
            }
        },
    ))
}

/// Apply a bank of 3x3 filters to a feature map, on the calling thread.
///
/// For every output channel `f` and output position `(row, col)` the result is
/// `bias[f] + sum_c sum_kr sum_kc input[c][row * stride + kr][col * stride + kc] * w[f, c, kr, kc]`
/// where `input` is the zero-padded feature map when padding is enabled.
///
/// The input is borrowed and a new tensor is returned.
///
/// # Arguments
///
/// * `src` - The input feature map with shape (in_channels, H, W).
/// * `param` - The trained filters and biases.
///
/// # Returns
///
/// The output feature map with shape (out_channels, H', W').
///
/// # Errors
///
/// Returns [`NnError::ShapeMismatch`] if the channel count differs from `in_channels` or the
/// input is smaller than the kernel.
pub fn conv2d_3x3(src: &Tensor3<f32>, param: &ConvParam) -> Result<Tensor3<f32>, NnError> {
    let (out_rows, out_cols) = check_input(src, param)?;
    let input = padded_input(src, param);
    let stride = param.stride();

    let mut dst = Tensor3::<f32>::zeros([param.out_channels(), out_rows, out_cols]);
    let dst_cols = dst.cols();
    let dst_slice = dst.as_slice_mut();

    for f in 0..param.out_channels() {
        for row in 0..out_rows {
            for col in 0..out_cols {
                let mut acc = param.bias()[f];
                for c in 0..param.in_channels() {
                    for kr in 0..KERNEL_SIZE {
                        for kc in 0..KERNEL_SIZE {
                            acc += input.get_unchecked([c, row * stride + kr, col * stride + kc])
                                * param.weight_at(f, c, kr, kc);
                        }
                    }
                }
                dst_slice[(f * out_rows + row) * dst_cols + col] = acc;
            }
        }
    }

    Ok(dst)
}

/// Apply a bank of 3x3 filters to a feature map, distributing output channels over rayon.
///
/// Every worker owns one output plane and reads the shared input and weights; the 3x3 tap
/// loop is unrolled per input channel. Returns once every plane is written. The result
/// matches [`conv2d_3x3`] up to summation order.
///
/// # Errors
///
/// Same as [`conv2d_3x3`].
pub fn conv2d_3x3_par(src: &Tensor3<f32>, param: &ConvParam) -> Result<Tensor3<f32>, NnError> {
    let (out_rows, out_cols) = check_input(src, param)?;
    let input = padded_input(src, param);
    let stride = param.stride();

    let in_cols = input.cols();
    let in_plane = input.plane_len();
    let in_data = input.as_slice();

    let mut dst = Tensor3::<f32>::zeros([param.out_channels(), out_rows, out_cols]);

    dst.as_slice_mut()
        .par_chunks_exact_mut(out_rows * out_cols)
        .enumerate()
        .for_each(|(f, dst_plane)| {
            dst_plane.fill(param.bias()[f]);

            for (c, src_plane) in in_data.chunks_exact(in_plane).enumerate() {
                let w = param.kernel(f, c);

                for (row, dst_row) in dst_plane.chunks_exact_mut(out_cols).enumerate() {
                    let top = row * stride * in_cols;
                    let r0 = &src_plane[top..top + in_cols];
                    let r1 = &src_plane[top + in_cols..top + 2 * in_cols];
                    let r2 = &src_plane[top + 2 * in_cols..top + 3 * in_cols];

                    for (col, out) in dst_row.iter_mut().enumerate() {
                        let x = col * stride;
                        *out += r0[x] * w[0]
                            + r0[x + 1] * w[1]
                            + r0[x + 2] * w[2]
                            + r1[x] * w[3]
                            + r1[x + 1] * w[4]
                            + r1[x + 2] * w[5]
                            + r2[x] * w[6]
                            + r2[x + 1] * w[7]
                            + r2[x + 2] * w[8];
                    }
                }
            }
        });

    Ok(dst)
}
