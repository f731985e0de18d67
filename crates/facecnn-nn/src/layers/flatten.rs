use facecnn_tensor::{Tensor1, Tensor3};

use crate::error::NnError;

/// Linearize a feature map into a vector, channel-major then row-major then column-major.
///
/// The data is moved, not copied; only the shape changes. The inverse is
/// `Tensor1::reshape([channels, rows, cols])`.
///
/// # Example
///
/// ```
/// use facecnn_nn::layers::flatten::flatten;
/// use facecnn_tensor::Tensor3;
///
/// let t = Tensor3::from_shape_fn([2, 2, 2], |[c, r, k]| (c * 4 + r * 2 + k) as f32);
/// let v = flatten(t).unwrap();
/// assert_eq!(v.shape, [8]);
/// assert_eq!(v.as_slice(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
/// ```
pub fn flatten(src: Tensor3<f32>) -> Result<Tensor1<f32>, NnError> {
    let numel = src.numel();
    Ok(src.reshape([numel])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_round_trip() -> Result<(), NnError> {
        let src = Tensor3::from_shape_fn([3, 4, 5], |[c, r, k]| (c * 20 + r * 5 + k) as f32 * 0.5);
        let vec = flatten(src.clone())?;
        assert_eq!(vec.shape, [60]);
        assert_eq!(vec.as_slice()[src.get_iter_offset_unchecked([2, 1, 3])], 48.0 * 0.5);

        let back: Tensor3<f32> = vec.reshape([3, 4, 5])?;
        assert_eq!(back, src);
        Ok(())
    }
}
