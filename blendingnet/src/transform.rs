//! Shared geometric transforms for combined-image pairs.
//!
//! Both halves of a combined image must receive the same random crop and
//! flip so the pair stays spatially aligned; only the grayscale conversion
//! differs per half. Parameters are therefore drawn once per sample and fed
//! to two independent [`ImageTransform`] instances.

use std::sync::Once;

use image::{imageops::FilterType, DynamicImage, GenericImageView};
use rand::{rngs::StdRng, Rng};

use crate::config::{DatasetConfig, Preprocess};

/// Random-but-fixed-per-sample augmentation decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformParams {
    /// Top-left corner of the crop window, in post-resize coordinates.
    pub crop_pos: (u32, u32),
    /// Whether to mirror horizontally.
    pub flip: bool,
}

/// Draw the augmentation parameters for one sample from its pre-transform size.
///
/// The crop offset is uniform over every placement of the crop window inside
/// the image as it will be sized after the configured resize step.
pub fn derive_params(config: &DatasetConfig, size: (u32, u32), rng: &mut StdRng) -> TransformParams {
    let (w, h) = size;
    let (new_w, new_h) = match config.preprocess {
        Preprocess::ResizeAndCrop => (config.load_size, config.load_size),
        Preprocess::ScaleWidthAndCrop => (config.load_size, config.load_size * h / w.max(1)),
        _ => (w, h),
    };

    let x = rng.random_range(0..=new_w.saturating_sub(config.crop_size));
    let y = rng.random_range(0..=new_h.saturating_sub(config.crop_size));
    let flip = rng.random_bool(0.5);

    TransformParams {
        crop_pos: (x, y),
        flip,
    }
}

/// The transform pipeline for one half of a combined image.
///
/// Two instances built from the same [`TransformParams`] apply identical
/// geometry; the grayscale flag is the only per-half difference.
pub struct ImageTransform {
    preprocess: Preprocess,
    load_size: u32,
    crop_size: u32,
    params: TransformParams,
    grayscale: bool,
    flip_enabled: bool,
}

impl ImageTransform {
    pub fn new(config: &DatasetConfig, params: TransformParams, grayscale: bool) -> Self {
        Self {
            preprocess: config.preprocess.clone(),
            load_size: config.load_size,
            crop_size: config.crop_size,
            params,
            grayscale,
            flip_enabled: !config.no_flip,
        }
    }

    /// Run the pipeline: grayscale conversion, resize, crop, flip.
    pub fn apply(&self, image: DynamicImage) -> DynamicImage {
        let mut image = if self.grayscale {
            image.grayscale()
        } else {
            image
        };

        image = match self.preprocess {
            Preprocess::ResizeAndCrop => {
                image.resize_exact(self.load_size, self.load_size, FilterType::CatmullRom)
            }
            Preprocess::ScaleWidth | Preprocess::ScaleWidthAndCrop => {
                scale_width(image, self.load_size, self.crop_size)
            }
            Preprocess::Keep => round_to_multiple_of_4(image),
            Preprocess::Crop => image,
        };

        if matches!(
            self.preprocess,
            Preprocess::ResizeAndCrop | Preprocess::Crop | Preprocess::ScaleWidthAndCrop
        ) {
            image = crop(image, self.params.crop_pos, self.crop_size);
        }

        if self.flip_enabled && self.params.flip {
            image = image.fliph();
        }

        image
    }
}

/// Scale the width to `target_width`, keeping the aspect ratio.
///
/// The height never drops below `crop_size` so a following crop stays valid.
fn scale_width(image: DynamicImage, target_width: u32, crop_size: u32) -> DynamicImage {
    let (ow, oh) = image.dimensions();
    if ow == target_width && oh >= crop_size {
        return image;
    }
    let h = (target_width * oh / ow.max(1)).max(crop_size);
    image.resize_exact(target_width, h, FilterType::CatmullRom)
}

/// Crop a `size x size` window at `pos`, if the image is larger than the window.
fn crop(image: DynamicImage, pos: (u32, u32), size: u32) -> DynamicImage {
    let (ow, oh) = image.dimensions();
    if ow > size || oh > size {
        image.crop_imm(pos.0, pos.1, size, size)
    } else {
        image
    }
}

/// Round both dimensions to the nearest multiple of 4, warning once.
///
/// Generator architectures with two down/upsampling stages need dimensions
/// divisible by 4.
fn round_to_multiple_of_4(image: DynamicImage) -> DynamicImage {
    const BASE: u32 = 4;
    let (ow, oh) = image.dimensions();
    let w = ((ow + BASE / 2) / BASE * BASE).max(BASE);
    let h = ((oh + BASE / 2) / BASE * BASE).max(BASE);
    if (w, h) == (ow, oh) {
        return image;
    }

    static WARN: Once = Once::new();
    WARN.call_once(|| {
        eprintln!(
            "Warning: image size ({ow}, {oh}) is not a multiple of {BASE}; \
             adjusting to ({w}, {h}). This is printed only once."
        );
    });

    image.resize_exact(w, h, FilterType::CatmullRom)
}

#[cfg(test)]
mod tests {
    use image::{ImageBuffer, Rgb};
    use rand::SeedableRng;

    use super::*;

    fn gradient_image(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(w, h, |x, y| {
            Rgb([x as u8, y as u8, 0])
        }))
    }

    #[test]
    fn params_stay_inside_the_resized_image() {
        let config = DatasetConfig::new()
            .with_load_size(286)
            .with_crop_size(256);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..100 {
            let params = derive_params(&config, (640, 480), &mut rng);
            assert!(params.crop_pos.0 <= 30);
            assert!(params.crop_pos.1 <= 30);
        }
    }

    #[test]
    fn params_are_deterministic_for_a_seeded_rng() {
        let config = DatasetConfig::new();
        let a = derive_params(&config, (512, 512), &mut StdRng::seed_from_u64(42));
        let b = derive_params(&config, (512, 512), &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn crop_mode_extracts_the_requested_window() {
        let config = DatasetConfig::new()
            .with_preprocess(Preprocess::Crop)
            .with_load_size(8)
            .with_crop_size(4)
            .with_no_flip(true);
        let params = TransformParams {
            crop_pos: (2, 1),
            flip: false,
        };

        let out = ImageTransform::new(&config, params, false).apply(gradient_image(8, 8));

        assert_eq!(out.dimensions(), (4, 4));
        // Top-left of the crop is the source pixel at (2, 1).
        assert_eq!(out.to_rgb8().get_pixel(0, 0), &Rgb([2, 1, 0]));
    }

    #[test]
    fn no_flip_overrides_the_flip_decision() {
        let config = DatasetConfig::new()
            .with_preprocess(Preprocess::Keep)
            .with_no_flip(true);
        let params = TransformParams {
            crop_pos: (0, 0),
            flip: true,
        };

        let out = ImageTransform::new(&config, params, false).apply(gradient_image(8, 8));
        assert_eq!(out.to_rgb8().get_pixel(0, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn flip_mirrors_horizontally() {
        let config = DatasetConfig::new().with_preprocess(Preprocess::Keep);
        let params = TransformParams {
            crop_pos: (0, 0),
            flip: true,
        };

        let out = ImageTransform::new(&config, params, false).apply(gradient_image(8, 8));
        assert_eq!(out.to_rgb8().get_pixel(0, 0), &Rgb([7, 0, 0]));
    }

    #[test]
    fn grayscale_flag_drops_to_one_channel() {
        let config = DatasetConfig::new().with_preprocess(Preprocess::Keep);
        let params = TransformParams {
            crop_pos: (0, 0),
            flip: false,
        };

        let out = ImageTransform::new(&config, params, true).apply(gradient_image(8, 8));
        assert_eq!(out.color().channel_count(), 1);
        assert_eq!(out.dimensions(), (8, 8));
    }

    #[test]
    fn scale_width_preserves_aspect_ratio() {
        let out = scale_width(gradient_image(200, 100), 100, 50);
        assert_eq!(out.dimensions(), (100, 50));
    }

    #[test]
    fn scale_width_clamps_height_to_the_crop_size() {
        let out = scale_width(gradient_image(200, 20), 100, 50);
        assert_eq!(out.dimensions(), (100, 50));
    }

    #[test]
    fn keep_mode_rounds_to_a_multiple_of_4() {
        let config = DatasetConfig::new()
            .with_preprocess(Preprocess::Keep)
            .with_no_flip(true);
        let params = TransformParams {
            crop_pos: (0, 0),
            flip: false,
        };

        let out = ImageTransform::new(&config, params, false).apply(gradient_image(10, 7));
        assert_eq!(out.dimensions(), (12, 8));
    }
}
