use rayon::prelude::*;

use facecnn_tensor::Tensor1;

use crate::{error::NnError, param::FcParam};

const LAYER: &str = "linear";

fn check_input(src: &Tensor1<f32>, param: &FcParam) -> Result<(), NnError> {
    if src.numel() != param.in_features() {
        return Err(NnError::shape_mismatch(
            LAYER,
            param.in_features(),
            src.numel(),
        ));
    }
    Ok(())
}

#[inline]
fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Dense affine projection, `output[o] = bias[o] + sum_i input[i] * weight[o, i]`.
///
/// Runs on the calling thread. The input is borrowed and a new vector is returned.
///
/// # Arguments
///
/// * `src` - Input vector of length `in_features`.
/// * `param` - Weights of shape `(out_features, in_features)` and `out_features` biases.
///
/// # Errors
///
/// Returns [`NnError::ShapeMismatch`] if the input length differs from `in_features`.
///
/// # Example
///
/// ```
/// use facecnn_nn::{layers::linear::linear, param::FcParam};
/// use facecnn_tensor::Tensor1;
///
/// let src = Tensor1::from_shape_vec([3], vec![1.0, 2.0, 3.0]).unwrap();
/// let param = FcParam::new(3, 2, vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6], vec![0.1, 0.2]).unwrap();
///
/// let dst = linear(&src, &param).unwrap();
/// assert!((dst.as_slice()[0] - 1.5).abs() < 1e-6);
/// assert!((dst.as_slice()[1] - 3.4).abs() < 1e-6);
/// ```
pub fn linear(src: &Tensor1<f32>, param: &FcParam) -> Result<Tensor1<f32>, NnError> {
    check_input(src, param)?;

    let out = (0..param.out_features())
        .map(|o| param.bias()[o] + dot(src.as_slice(), param.row(o)))
        .collect::<Vec<_>>();

    Ok(Tensor1::from_shape_vec([param.out_features()], out)?)
}

/// Same as [`linear`], one output feature per rayon task.
pub fn linear_par(src: &Tensor1<f32>, param: &FcParam) -> Result<Tensor1<f32>, NnError> {
    check_input(src, param)?;

    let mut dst = Tensor1::<f32>::zeros([param.out_features()]);
    dst.as_slice_mut()
        .par_iter_mut()
        .enumerate()
        .for_each(|(o, out)| *out = param.bias()[o] + dot(src.as_slice(), param.row(o)));

    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_known_values() -> Result<(), NnError> {
        let src = Tensor1::from_shape_vec([4], vec![1.0, -1.0, 2.0, 0.5])?;
        let param = FcParam::new(
            4,
            2,
            vec![1.0, 2.0, 3.0, 4.0, -1.0, 0.0, 0.5, 2.0],
            vec![0.5, -0.5],
        )?;

        // 0.5 + (1 - 2 + 6 + 2) and -0.5 + (-1 + 0 + 1 + 1)
        for dst in [linear(&src, &param)?, linear_par(&src, &param)?] {
            assert_eq!(dst.shape, [2]);
            assert_relative_eq!(dst.as_slice()[0], 7.5);
            assert_relative_eq!(dst.as_slice()[1], 0.5);
        }
        Ok(())
    }

    #[test]
    fn test_linear_length_mismatch() -> Result<(), NnError> {
        let src = Tensor1::from_shape_vec([3], vec![1.0, 2.0, 3.0])?;
        let param = FcParam::new(4, 2, vec![0.0; 8], vec![0.0; 2])?;
        assert!(matches!(
            linear(&src, &param),
            Err(NnError::ShapeMismatch { layer: "linear", .. })
        ));
        assert!(linear_par(&src, &param).is_err());
        Ok(())
    }
}
