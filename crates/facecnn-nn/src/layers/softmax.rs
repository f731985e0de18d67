use facecnn_tensor::Tensor1;

/// Turn raw scores into a probability distribution, `exp(x_i) / sum_j exp(x_j)`.
///
/// The maximum score is not subtracted before exponentiation, so scores above roughly 88
/// overflow `f32` and yield non-finite probabilities. The input is consumed and returned
/// with the same length.
///
/// # Example
///
/// ```
/// use facecnn_nn::layers::softmax::softmax;
/// use facecnn_tensor::Tensor1;
///
/// let p = softmax(Tensor1::from_shape_vec([2], vec![0.0, 0.0]).unwrap());
/// assert_eq!(p.as_slice(), &[0.5, 0.5]);
/// ```
pub fn softmax(mut src: Tensor1<f32>) -> Tensor1<f32> {
    src.iter_mut().for_each(|x| *x = x.exp());
    let sum = src.iter().sum::<f32>();
    src.iter_mut().for_each(|x| *x /= sum);
    src
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn test_softmax_is_distribution() {
        let scores = [-3.0f32, -0.25, 0.0, 1.5, 4.0];
        let p = softmax(Tensor1::from_shape_vec([5], scores.to_vec()).unwrap());
        assert_relative_eq!(p.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        assert!(p.iter().all(|x| (0.0..=1.0).contains(x)));
        // order is preserved
        assert!(p.as_slice().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_softmax_is_distribution_random() {
        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let len = rng.random_range(2..8);
            let scores = (0..len)
                .map(|_| rng.random_range(-10.0f32..10.0))
                .collect::<Vec<_>>();

            let p = softmax(Tensor1::from_shape_vec([len], scores.clone()).unwrap());
            assert_relative_eq!(p.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
            assert!(p.iter().all(|x| (0.0..=1.0).contains(x)), "seed {seed}");

            // the largest score gets the largest probability
            let argmax = |v: &[f32]| {
                v.iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(i, _)| i)
            };
            assert_eq!(argmax(&scores), argmax(p.as_slice()), "seed {seed}");
        }
    }

    #[test]
    fn test_softmax_two_classes() {
        let p = softmax(Tensor1::from_shape_vec([2], vec![1.0, 2.0]).unwrap());
        let e = std::f32::consts::E;
        assert_relative_eq!(p.as_slice()[1], e / (1.0 + e), epsilon = 1e-6);
    }

    #[test]
    fn test_softmax_overflows_without_stabilization() {
        let p = softmax(Tensor1::from_shape_vec([2], vec![100.0, 0.0]).unwrap());
        assert!(!p.as_slice()[0].is_finite());
    }
}
