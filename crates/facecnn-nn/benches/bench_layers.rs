use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use facecnn_image::{Image, ImageSize};
use facecnn_nn::{
    layers::conv::{conv2d_3x3, conv2d_3x3_par},
    ConvParam, ExecutionStrategy, FaceClassifier, FcParam, NetworkConfig,
};
use facecnn_tensor::Tensor3;

fn random_vec(rng: &mut StdRng, len: usize) -> Vec<f32> {
    (0..len).map(|_| rng.random_range(-0.5..0.5)).collect()
}

fn random_conv(rng: &mut StdRng, in_channels: usize, out_channels: usize) -> ConvParam {
    let weight = random_vec(rng, out_channels * in_channels * 9);
    let bias = random_vec(rng, out_channels);
    ConvParam::new(in_channels, out_channels, true, 1, weight, bias).unwrap()
}

fn bench_conv(c: &mut Criterion) {
    let mut group = c.benchmark_group("conv2d_3x3");
    let mut rng = StdRng::seed_from_u64(0);

    for (in_channels, out_channels, dim) in [(3, 8, 32), (8, 16, 16), (16, 32, 8)] {
        let param = random_conv(&mut rng, in_channels, out_channels);
        let src = Tensor3::from_shape_vec(
            [in_channels, dim, dim],
            random_vec(&mut rng, in_channels * dim * dim),
        )
        .unwrap();
        let parameter_string = format!("{in_channels}x{dim}x{dim}->{out_channels}");

        group.bench_with_input(
            BenchmarkId::new("reference", &parameter_string),
            &(&src, &param),
            |b, (src, param)| b.iter(|| std::hint::black_box(conv2d_3x3(src, param).unwrap())),
        );

        group.bench_with_input(
            BenchmarkId::new("parallel", &parameter_string),
            &(&src, &param),
            |b, (src, param)| {
                b.iter(|| std::hint::black_box(conv2d_3x3_par(src, param).unwrap()))
            },
        );
    }
    group.finish();
}

fn bench_forward(c: &mut Criterion) {
    let mut group = c.benchmark_group("forward");
    let mut rng = StdRng::seed_from_u64(1);

    let conv = [
        random_conv(&mut rng, 3, 8),
        random_conv(&mut rng, 8, 16),
        random_conv(&mut rng, 16, 32),
    ];
    let fc = FcParam::new(2048, 2, random_vec(&mut rng, 4096), vec![0.0; 2]).unwrap();
    let config = NetworkConfig::new(conv, fc).unwrap();

    let data = (0..32 * 32 * 3).map(|_| rng.random::<u8>()).collect();
    let image = Image::<u8, 3>::new(
        ImageSize {
            width: 32,
            height: 32,
        },
        data,
    )
    .unwrap();

    for strategy in [
        ExecutionStrategy::Reference,
        ExecutionStrategy::Parallel,
        ExecutionStrategy::Fixed(2),
    ] {
        let model = FaceClassifier::new(config.clone(), strategy).unwrap();
        group.bench_function(BenchmarkId::new("classifier", strategy), |b| {
            b.iter(|| std::hint::black_box(model.forward(&image).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_conv, bench_forward);
criterion_main!(benches);
