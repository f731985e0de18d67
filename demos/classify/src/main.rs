use argh::FromArgs;
use std::path::{Path, PathBuf};

use facecnn::image::{Image, ImageSize};
use facecnn::nn::{ExecutionStrategy, FaceClassifier, NetworkConfig};

#[derive(FromArgs)]
/// Score an image as background or face and print the time spent in every stage.
struct Args {
    /// path to an input image
    #[argh(option, short = 'i')]
    image_path: PathBuf,

    /// path to the trained weights (JSON)
    #[argh(option, short = 'w')]
    weights: PathBuf,

    /// execution strategy: reference, parallel or fixed:<threads>
    #[argh(option, short = 's', default = "ExecutionStrategy::Parallel")]
    strategy: ExecutionStrategy,
}

/// Decode an image file into interleaved BGR samples.
fn read_image_bgr8(path: &Path) -> Result<Image<u8, 3>, Box<dyn std::error::Error>> {
    let rgb = image::open(path)?.to_rgb8();
    let size = ImageSize {
        width: rgb.width() as usize,
        height: rgb.height() as usize,
    };

    let mut data = rgb.into_raw();
    data.chunks_exact_mut(3).for_each(|px| px.swap(0, 2));

    Ok(Image::new(size, data)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let config = NetworkConfig::from_json_file(&args.weights)?;
    let model = FaceClassifier::new(config, args.strategy)?;
    println!("CNN implementation: {}", model.strategy_name());

    let image = read_image_bgr8(&args.image_path)?;
    log::info!("read {} ({})", args.image_path.display(), image.size());

    let report = model.forward_timed(&image)?;
    for timing in &report.timings {
        println!("{}: {:?}", timing.stage, timing.elapsed);
    }
    println!("total: {:?}", report.total());

    println!("{}", report.prediction);
    if !report.prediction.is_finite() {
        log::warn!("the prediction is not finite, check the input image");
    }

    Ok(())
}
