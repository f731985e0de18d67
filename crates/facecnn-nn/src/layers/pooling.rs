use rayon::prelude::*;

use facecnn_tensor::Tensor3;

use crate::error::NnError;

const LAYER: &str = "max_pool";

/// Returns the output `(rows, cols)` of a `window x window` pooling.
fn output_size(src: &Tensor3<f32>, window: usize) -> Result<(usize, usize), NnError> {
    if window == 0 {
        return Err(NnError::invalid_parameter(LAYER, "window must be > 0"));
    }
    if src.rows() < window || src.cols() < window {
        return Err(NnError::invalid_parameter(
            LAYER,
            format!(
                "window {window} is larger than the {}x{} input",
                src.rows(),
                src.cols()
            ),
        ));
    }
    Ok((src.rows() / window, src.cols() / window))
}

/// Maximum of the window whose top-left corner is at `(top, left)` in a plane.
#[inline]
fn window_max(plane: &[f32], cols: usize, top: usize, left: usize, window: usize) -> f32 {
    let mut max = f32::NEG_INFINITY;
    for r in top..top + window {
        let start = r * cols + left;
        for &x in &plane[start..start + window] {
            // NaN wins so that degenerate values keep propagating
            if x > max || x.is_nan() {
                max = x;
            }
        }
        if max.is_nan() {
            break;
        }
    }
    max
}

/// Downsample every channel by taking the maximum of non-overlapping square windows.
///
/// Windows have side `window` and stride `window`. The output has
/// `floor(rows / window) x floor(cols / window)` elements per channel; trailing rows and
/// columns that do not fill a whole window are dropped. The input is borrowed and a new
/// tensor is returned.
///
/// # Errors
///
/// Returns [`NnError::InvalidParameter`] if `window` is zero or larger than the input.
///
/// # Example
///
/// ```
/// use facecnn_nn::layers::pooling::max_pool2d;
/// use facecnn_tensor::Tensor3;
///
/// let src = Tensor3::from_shape_fn([1, 4, 4], |[_, r, c]| (r * 4 + c + 1) as f32);
/// let dst = max_pool2d(&src, 2).unwrap();
/// assert_eq!(dst.as_slice(), &[6.0, 8.0, 14.0, 16.0]);
/// ```
pub fn max_pool2d(src: &Tensor3<f32>, window: usize) -> Result<Tensor3<f32>, NnError> {
    let (out_rows, out_cols) = output_size(src, window)?;
    let cols = src.cols();

    Ok(Tensor3::from_shape_fn(
        [src.channels(), out_rows, out_cols],
        |[c, r, k]| window_max(src.channel(c), cols, r * window, k * window, window),
    ))
}

/// Same as [`max_pool2d`], one output channel per rayon task.
pub fn max_pool2d_par(src: &Tensor3<f32>, window: usize) -> Result<Tensor3<f32>, NnError> {
    let (out_rows, out_cols) = output_size(src, window)?;
    let cols = src.cols();

    let mut dst = Tensor3::<f32>::zeros([src.channels(), out_rows, out_cols]);
    dst.as_slice_mut()
        .par_chunks_exact_mut(out_rows * out_cols)
        .zip(src.as_slice().par_chunks_exact(src.plane_len()))
        .for_each(|(dst_plane, src_plane)| {
            for (r, dst_row) in dst_plane.chunks_exact_mut(out_cols).enumerate() {
                for (k, out) in dst_row.iter_mut().enumerate() {
                    *out = window_max(src_plane, cols, r * window, k * window, window);
                }
            }
        });

    Ok(dst)
}
