use rayon::prelude::*;

use facecnn_tensor::Tensor3;

/// Rectify a feature map in place, `x = max(0, x)`, on the calling thread.
///
/// The input is consumed and returned with the same shape. NaN values stay NaN.
///
/// # Example
///
/// ```
/// use facecnn_nn::layers::activation::relu;
/// use facecnn_tensor::Tensor3;
///
/// let t = Tensor3::from_shape_vec([1, 1, 3], vec![-1.0f32, 0.0, 2.5]).unwrap();
/// assert_eq!(relu(t).as_slice(), &[0.0, 0.0, 2.5]);
/// ```
pub fn relu(mut src: Tensor3<f32>) -> Tensor3<f32> {
    src.iter_mut().for_each(rectify);
    src
}

/// Rectify a feature map in place, one channel per rayon task.
pub fn relu_par(mut src: Tensor3<f32>) -> Tensor3<f32> {
    let plane_len = src.plane_len().max(1);
    src.as_slice_mut()
        .par_chunks_mut(plane_len)
        .for_each(|plane| plane.iter_mut().for_each(rectify));
    src
}

#[inline]
fn rectify(x: &mut f32) {
    if *x < 0.0 {
        *x = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn signed() -> Tensor3<f32> {
        Tensor3::from_shape_fn([3, 4, 4], |[c, r, k]| {
            (c as f32 - 1.0) * (r as f32 - 1.5) * (k as f32 + 0.25)
        })
    }

    #[test]
    fn test_relu_idempotent() {
        let once = relu(signed());
        let twice = relu(once.clone());
        assert_eq!(once, twice);
        assert!(once.iter().all(|&x| x >= 0.0));
    }

    #[test]
    fn test_relu_idempotent_random() {
        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let shape: [usize; 3] = [
                rng.random_range(1..5),
                rng.random_range(1..9),
                rng.random_range(1..9),
            ];
            let data = (0..shape.iter().product::<usize>())
                .map(|_| rng.random_range(-2.0f32..2.0))
                .collect();
            let src = Tensor3::from_shape_vec(shape, data).unwrap();

            let once = relu(src.clone());
            assert_eq!(relu(once.clone()), once, "seed {seed}");
            assert_eq!(relu_par(once.clone()), once, "seed {seed}");
            assert!(once.iter().all(|&x| x >= 0.0), "seed {seed}");
            assert!(
                src.iter().zip(once.iter()).all(|(&a, &b)| b == a.max(0.0)),
                "seed {seed}"
            );
        }
    }

    #[test]
    fn test_relu_par_matches_serial() {
        let a = relu(signed());
        let b = relu_par(signed());
        assert_eq!(a, b);
        assert_eq!(relu_par(b.clone()), b);
    }

    #[test]
    fn test_relu_keeps_positive() {
        let src = Tensor3::from_shape_vec([1, 2, 2], vec![-0.5f32, 0.5, -2.0, 3.0]).unwrap();
        assert_eq!(relu(src).as_slice(), &[0.0, 0.5, 0.0, 3.0]);
    }
}
