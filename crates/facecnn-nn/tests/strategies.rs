use approx::assert_abs_diff_eq;
use rand::{rngs::StdRng, Rng, SeedableRng};

use facecnn_image::{Image, ImageSize};
use facecnn_nn::{
    layers::conv::{conv2d_3x3, conv2d_3x3_par},
    ConvParam, ExecutionStrategy, FaceClassifier, FcParam, NetworkConfig, NnError, Prediction,
};
use facecnn_tensor::Tensor3;

const IMAGE_SIZE: usize = 32;

fn random_vec(rng: &mut StdRng, len: usize, scale: f32) -> Vec<f32> {
    (0..len).map(|_| rng.random_range(-scale..scale)).collect()
}

fn random_conv(rng: &mut StdRng, in_channels: usize, out_channels: usize) -> ConvParam {
    let weight = random_vec(rng, out_channels * in_channels * 9, 0.5);
    let bias = random_vec(rng, out_channels, 0.1);
    ConvParam::new(in_channels, out_channels, true, 1, weight, bias).unwrap()
}

/// A network with the trained model's topology: 3 -> 8 -> 16 -> 32 channels on 32x32 input.
fn random_config(seed: u64) -> NetworkConfig {
    let mut rng = StdRng::seed_from_u64(seed);
    let conv = [
        random_conv(&mut rng, 3, 8),
        random_conv(&mut rng, 8, 16),
        random_conv(&mut rng, 16, 32),
    ];
    let in_features = 32 * 8 * 8;
    let fc = FcParam::new(
        in_features,
        2,
        random_vec(&mut rng, 2 * in_features, 0.02),
        random_vec(&mut rng, 2, 0.1),
    )
    .unwrap();
    NetworkConfig::new(conv, fc).unwrap()
}

fn random_image(seed: u64) -> Image<u8, 3> {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..IMAGE_SIZE * IMAGE_SIZE * 3)
        .map(|_| rng.random::<u8>())
        .collect();
    Image::new(
        ImageSize {
            width: IMAGE_SIZE,
            height: IMAGE_SIZE,
        },
        data,
    )
    .unwrap()
}

fn assert_close(a: &Prediction, b: &Prediction, epsilon: f32) {
    assert_abs_diff_eq!(a.background, b.background, epsilon = epsilon);
    assert_abs_diff_eq!(a.face, b.face, epsilon = epsilon);
}

#[test]
fn conv_strategies_agree() -> Result<(), NnError> {
    let mut rng = StdRng::seed_from_u64(42);

    for (in_channels, out_channels, pad, stride, dim) in [
        (3, 8, true, 1, 32),
        (8, 16, true, 1, 16),
        (16, 32, true, 1, 8),
        (4, 5, false, 1, 9),
        (4, 5, true, 2, 11),
    ] {
        let weight = random_vec(&mut rng, out_channels * in_channels * 9, 0.5);
        let bias = random_vec(&mut rng, out_channels, 0.1);
        let param = ConvParam::new(in_channels, out_channels, pad, stride, weight, bias)?;
        let src = Tensor3::from_shape_vec(
            [in_channels, dim, dim],
            random_vec(&mut rng, in_channels * dim * dim, 2.0),
        )?;

        let reference = conv2d_3x3(&src, &param)?;
        let parallel = conv2d_3x3_par(&src, &param)?;
        assert_eq!(reference.shape, parallel.shape);
        assert_eq!(Some(reference.rows()), param.output_dim(dim));
        for (x, y) in reference.iter().zip(parallel.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-4);
        }
    }
    Ok(())
}

#[test]
fn forward_is_deterministic() -> Result<(), NnError> {
    let image = random_image(1);
    for strategy in [ExecutionStrategy::Reference, ExecutionStrategy::Parallel] {
        let model = FaceClassifier::new(random_config(7), strategy)?;
        let first = model.forward(&image)?;
        let second = model.forward(&image)?;
        assert!(first.is_finite());
        assert_close(&first, &second, 1e-5);
    }
    Ok(())
}

#[test]
fn strategies_agree_end_to_end() -> Result<(), NnError> {
    let config = random_config(11);
    let reference = FaceClassifier::new(config.clone(), ExecutionStrategy::Reference)?;
    let parallel = FaceClassifier::new(config.clone(), ExecutionStrategy::Parallel)?;
    let fixed = FaceClassifier::new(config, ExecutionStrategy::Fixed(2))?;

    for seed in 0..3 {
        let image = random_image(seed);
        let a = reference.forward(&image)?;
        let b = parallel.forward(&image)?;
        let c = fixed.forward(&image)?;
        assert_abs_diff_eq!(a.background + a.face, 1.0, epsilon = 1e-5);
        assert_close(&a, &b, 1e-4);
        assert_close(&b, &c, 1e-5);
    }
    Ok(())
}

#[test]
fn classifier_is_shareable_across_threads() -> Result<(), NnError> {
    let model = FaceClassifier::new(random_config(3), ExecutionStrategy::Parallel)?;
    let image = random_image(5);
    let expected = model.forward(&image)?;

    std::thread::scope(|s| {
        let handles = (0..3)
            .map(|_| s.spawn(|| model.forward(&image)))
            .collect::<Vec<_>>();
        for handle in handles {
            let p = handle.join().unwrap().unwrap();
            assert_close(&p, &expected, 1e-6);
        }
    });
    Ok(())
}

#[test]
fn zero_image_is_degenerate_not_an_error() -> Result<(), NnError> {
    // a black image with zero biases makes every block 1 channel all zero
    let mut rng = StdRng::seed_from_u64(9);
    let weight = random_vec(&mut rng, 8 * 3 * 9, 0.5);
    let conv1 = ConvParam::new(3, 8, true, 1, weight, vec![0.0; 8])?;
    let base = random_config(9);
    let [_, conv2, conv3] = base.conv().clone();
    let config = NetworkConfig::new([conv1, conv2, conv3], base.fc().clone())?;

    let image = Image::<u8, 3>::from_size_val(
        ImageSize {
            width: IMAGE_SIZE,
            height: IMAGE_SIZE,
        },
        0,
    )?;

    for strategy in [ExecutionStrategy::Reference, ExecutionStrategy::Parallel] {
        let model = FaceClassifier::new(config.clone(), strategy)?;
        let p = model.forward(&image)?;
        assert!(!p.is_finite());
    }
    Ok(())
}
