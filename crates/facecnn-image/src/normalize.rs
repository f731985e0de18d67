//! Conversion of decoded 8-bit images into normalized, channel-first tensors.
//!
//! The decoder hands over interleaved pixels with the samples ordered blue, green, red. The
//! classifier expects a `(3, rows, cols)` tensor with the planes ordered red, green, blue and
//! every value in `[0, 1]`. No resizing or cropping happens here.
//!
//! Two ways of scaling are supported, see [`ScaleMode`]. They agree to within `1e-6` per
//! element.
//!
//! # Example
//!
//! ```
//! use facecnn_image::{Image, ImageSize};
//! use facecnn_image::normalize::{bgr_to_rgb_planar, ScaleMode};
//!
//! // a single pixel with blue = 0, green = 51, red = 255
//! let image = Image::<u8, 3>::new(ImageSize { width: 1, height: 1 }, vec![0, 51, 255]).unwrap();
//! let tensor = bgr_to_rgb_planar(&image, ScaleMode::Sample).unwrap();
//!
//! assert_eq!(tensor.shape, [3, 1, 1]);
//! assert_eq!(tensor.as_slice()[0], 1.0);
//! assert_eq!(tensor.as_slice()[2], 0.0);
//! ```

use rayon::prelude::*;

use facecnn_tensor::Tensor3;

use crate::{error::ImageError, image::Image};

const INV_255: f32 = 1.0 / 255.0;

/// How 8-bit samples are brought into the `[0, 1]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleMode {
    /// Multiply the whole buffer by `1 / 255` before sampling it.
    #[default]
    Buffer,
    /// Divide every sampled integer by `255` at read time.
    Sample,
}

impl ScaleMode {
    #[inline]
    fn scale(self, v: u8) -> f32 {
        match self {
            ScaleMode::Buffer => f32::from(v) * INV_255,
            ScaleMode::Sample => f32::from(v) / 255.0,
        }
    }
}

fn check_not_empty(src: &Image<u8, 3>) -> Result<(), ImageError> {
    if src.size().is_empty() {
        return Err(ImageError::EmptyImage {
            width: src.width(),
            height: src.height(),
        });
    }
    Ok(())
}

/// Convert a BGR image into an RGB channel-first tensor with values in `[0, 1]`.
///
/// Runs on the calling thread.
///
/// # Arguments
///
/// * `src` - The decoded image with shape (H, W, 3), samples ordered blue, green, red.
/// * `mode` - How the 8-bit samples are scaled.
///
/// # Returns
///
/// A tensor with shape (3, H, W), planes ordered red, green, blue.
///
/// # Errors
///
/// Returns [`ImageError::EmptyImage`] if the image has a zero dimension.
pub fn bgr_to_rgb_planar(src: &Image<u8, 3>, mode: ScaleMode) -> Result<Tensor3<f32>, ImageError> {
    check_not_empty(src)?;

    let (rows, cols) = (src.rows(), src.cols());

    let tensor = match mode {
        ScaleMode::Buffer => {
            let scaled = src.cast_and_scale::<f32>(INV_255)?;
            Tensor3::from_shape_fn([3, rows, cols], |[c, r, k]| {
                // plane 0 is red, which is the last sample of a BGR pixel
                *scaled.get_unchecked([r, k, 2 - c])
            })
        }
        ScaleMode::Sample => Tensor3::from_shape_fn([3, rows, cols], |[c, r, k]| {
            mode.scale(*src.get_unchecked([r, k, 2 - c]))
        }),
    };

    Ok(tensor)
}

/// Convert a BGR image into an RGB channel-first tensor with values in `[0, 1]`, in parallel.
///
/// Rows are distributed over the rayon thread pool; every row writes to a disjoint row of
/// each output plane. Returns once all rows are written.
///
/// # Errors
///
/// Returns [`ImageError::EmptyImage`] if the image has a zero dimension.
pub fn bgr_to_rgb_planar_par(
    src: &Image<u8, 3>,
    mode: ScaleMode,
) -> Result<Tensor3<f32>, ImageError> {
    check_not_empty(src)?;

    let (rows, cols) = (src.rows(), src.cols());
    let plane = rows * cols;

    let mut dst = vec![0.0f32; 3 * plane];
    let (red, rest) = dst.split_at_mut(plane);
    let (green, blue) = rest.split_at_mut(plane);

    src.as_slice()
        .par_chunks_exact(3 * cols)
        .zip(red.par_chunks_exact_mut(cols))
        .zip(green.par_chunks_exact_mut(cols))
        .zip(blue.par_chunks_exact_mut(cols))
        .for_each(|(((src_row, r_row), g_row), b_row)| {
            for (i, px) in src_row.chunks_exact(3).enumerate() {
                b_row[i] = mode.scale(px[0]);
                g_row[i] = mode.scale(px[1]);
                r_row[i] = mode.scale(px[2]);
            }
        });

    Ok(Tensor3::from_shape_vec([3, rows, cols], dst)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageSize;
    use approx::assert_abs_diff_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_image(width: usize, height: usize) -> Result<Image<u8, 3>, ImageError> {
        let mut rng = StdRng::seed_from_u64(7);
        let data = (0..width * height * 3).map(|_| rng.random::<u8>()).collect();
        Image::new(ImageSize { width, height }, data)
    }

    #[test]
    fn test_channel_order_and_range() -> Result<(), ImageError> {
        // two pixels: (b, g, r) = (10, 20, 30) and (255, 0, 128)
        let image = Image::<u8, 3>::new(
            ImageSize {
                width: 2,
                height: 1,
            },
            vec![10, 20, 30, 255, 0, 128],
        )?;

        let t = bgr_to_rgb_planar(&image, ScaleMode::Sample)?;
        assert_eq!(t.shape, [3, 1, 2]);
        assert_abs_diff_eq!(t.row(0, 0)[0], 30.0 / 255.0);
        assert_abs_diff_eq!(t.row(1, 0)[0], 20.0 / 255.0);
        assert_abs_diff_eq!(t.row(2, 0)[0], 10.0 / 255.0);
        assert_abs_diff_eq!(t.row(0, 0)[1], 128.0 / 255.0);
        assert_abs_diff_eq!(t.row(2, 0)[1], 1.0);
        assert!(t.iter().all(|v| (0.0..=1.0).contains(v)));
        Ok(())
    }

    #[test]
    fn test_scale_modes_agree() -> Result<(), ImageError> {
        let image = random_image(17, 17)?;
        let a = bgr_to_rgb_planar(&image, ScaleMode::Buffer)?;
        let b = bgr_to_rgb_planar(&image, ScaleMode::Sample)?;
        assert_eq!(a.shape, b.shape);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-6);
        }
        Ok(())
    }

    #[test]
    fn test_parallel_matches_serial() -> Result<(), ImageError> {
        let image = random_image(32, 32)?;
        for mode in [ScaleMode::Buffer, ScaleMode::Sample] {
            let serial = bgr_to_rgb_planar(&image, mode)?;
            let parallel = bgr_to_rgb_planar_par(&image, mode)?;
            assert_eq!(serial.shape, parallel.shape);
            for (x, y) in serial.iter().zip(parallel.iter()) {
                assert_abs_diff_eq!(x, y, epsilon = 1e-6);
            }
        }
        Ok(())
    }

    #[test]
    fn test_keeps_size() -> Result<(), ImageError> {
        let image = random_image(5, 3)?;
        let t = bgr_to_rgb_planar_par(&image, ScaleMode::Sample)?;
        assert_eq!(t.shape, [3, 3, 5]);
        Ok(())
    }

    #[test]
    fn test_empty_image() -> Result<(), ImageError> {
        let image = Image::<u8, 3>::new(
            ImageSize {
                width: 0,
                height: 4,
            },
            vec![],
        )?;
        assert_eq!(
            bgr_to_rgb_planar(&image, ScaleMode::Buffer).err(),
            Some(ImageError::EmptyImage {
                width: 0,
                height: 4
            })
        );
        assert!(bgr_to_rgb_planar_par(&image, ScaleMode::Sample).is_err());
        Ok(())
    }
}
