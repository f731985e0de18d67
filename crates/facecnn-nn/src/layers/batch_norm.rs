use rayon::prelude::*;

use facecnn_tensor::Tensor3;

use crate::error::NnError;

const LAYER: &str = "batch_norm";

/// Normalizes one channel plane in place, returning `false` if its second moment is zero.
fn normalize_plane(plane: &mut [f32]) -> bool {
    let n = plane.len() as f32;

    let (sum, sum_sq) = plane
        .iter()
        .fold((0.0f32, 0.0f32), |(s, sq), &x| (s + x, sq + x * x));
    let mean = sum / n;
    let second_moment = sum_sq / n;

    // a zero second moment divides by zero; the non-finite values are kept
    let std = second_moment.sqrt();
    plane.iter_mut().for_each(|x| *x = (*x - mean) / std);

    second_moment != 0.0
}

fn check_input(src: &Tensor3<f32>) -> Result<(), NnError> {
    if src.plane_len() == 0 {
        return Err(NnError::shape_mismatch(
            LAYER,
            "non-empty channel planes",
            src.shape,
        ));
    }
    Ok(())
}

fn warn_degenerate(channel: usize) {
    log::warn!("{LAYER}: channel {channel} has a zero second moment, output is not finite");
}

/// Standardize every channel of a feature map in place, on the calling thread.
///
/// For each channel independently, `mean = sum(x) / n` and `second_moment = sum(x^2) / n`
/// are computed over the `n = rows * cols` elements of that channel, and every element is
/// replaced by `(x - mean) / sqrt(second_moment)`. The denominator is the raw second moment
/// `E[x^2]`, not the variance `E[x^2] - E[x]^2`. No learned scale or shift is applied.
///
/// The input is consumed and returned with the same shape.
///
/// A channel whose elements are all zero has a zero second moment: its output is NaN (or
/// infinite) and propagates through the rest of the network. This is logged as a warning
/// and not reported as an error.
///
/// # Errors
///
/// Returns [`NnError::ShapeMismatch`] if the channel planes are empty.
pub fn batch_norm(mut src: Tensor3<f32>) -> Result<Tensor3<f32>, NnError> {
    check_input(&src)?;

    let plane_len = src.plane_len();
    src.as_slice_mut()
        .chunks_exact_mut(plane_len)
        .enumerate()
        .for_each(|(c, plane)| {
            if !normalize_plane(plane) {
                warn_degenerate(c);
            }
        });

    Ok(src)
}

/// Standardize every channel of a feature map in place, one channel per rayon task.
///
/// Same semantics as [`batch_norm`]. Returns once every channel is normalized.
pub fn batch_norm_par(mut src: Tensor3<f32>) -> Result<Tensor3<f32>, NnError> {
    check_input(&src)?;

    let plane_len = src.plane_len();
    src.as_slice_mut()
        .par_chunks_exact_mut(plane_len)
        .enumerate()
        .for_each(|(c, plane)| {
            if !normalize_plane(plane) {
                warn_degenerate(c);
            }
        });

    Ok(src)
}
