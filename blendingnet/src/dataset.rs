//! Paired image dataset for combined side-by-side training images.
//!
//! Each file on disk holds an input/target pair concatenated horizontally:
//! the left half is domain A, the right half is domain B. Samples are
//! decoded, split at the midpoint, and pushed through a shared augmentation
//! pipeline so both halves stay spatially aligned.

use std::{marker::PhantomData, path::PathBuf};

use burn::{
    data::{dataloader::batcher::Batcher, dataset::Dataset},
    tensor::{backend::Backend, Tensor, TensorData},
};
use image::{DynamicImage, GenericImageView};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    config::DatasetConfig,
    error::{DatasetError, DatasetResult},
    image_folder,
    transform::{derive_params, ImageTransform},
};

/// A single aligned sample: both halves of one combined image after
/// augmentation, plus the file they came from.
#[derive(Debug, Clone)]
pub struct PairedItem<B: Backend> {
    /// Input-domain tensor with shape [C, H, W], values in [-1, 1].
    pub a: Tensor<B, 3>,
    /// Target-domain tensor with shape [C, H, W], values in [-1, 1].
    pub b: Tensor<B, 3>,
    /// Source file of the A half.
    pub a_path: PathBuf,
    /// Source file of the B half (the same combined file as `a_path`).
    pub b_path: PathBuf,
}

/// A batch of aligned samples stacked along a new leading dimension.
#[derive(Debug, Clone)]
pub struct PairedBatch<B: Backend> {
    /// Batched input tensor with shape [N, C, H, W].
    pub a: Tensor<B, 4>,
    /// Batched target tensor with shape [N, C, H, W].
    pub b: Tensor<B, 4>,
    /// Source files of the A halves, in batch order.
    pub a_paths: Vec<PathBuf>,
    /// Source files of the B halves, in batch order.
    pub b_paths: Vec<PathBuf>,
}

/// Batcher converting vectors of [`PairedItem`] into a [`PairedBatch`].
#[derive(Clone, Default)]
pub struct PairedBatcher<B: Backend> {
    _phantom: PhantomData<B>,
}

impl<B: Backend> PairedBatcher<B> {
    /// Create a new batcher.
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<B: Backend> Batcher<B, PairedItem<B>, PairedBatch<B>> for PairedBatcher<B> {
    fn batch(&self, items: Vec<PairedItem<B>>, _device: &B::Device) -> PairedBatch<B> {
        let batch_size = items.len();

        let mut a = Vec::with_capacity(batch_size);
        let mut b = Vec::with_capacity(batch_size);
        let mut a_paths = Vec::with_capacity(batch_size);
        let mut b_paths = Vec::with_capacity(batch_size);

        for item in items {
            a.push(item.a);
            b.push(item.b);
            a_paths.push(item.a_path);
            b_paths.push(item.b_path);
        }

        PairedBatch {
            a: Tensor::stack(a, 0),
            b: Tensor::stack(b, 0),
            a_paths,
            b_paths,
        }
    }
}

/// Dataset over a directory of combined double-width images.
///
/// Construction resolves `<dataroot>/<phase>` into a sorted, size-capped
/// path list; retrieval decodes one file per access. The path list and
/// channel counts are fixed at construction, so concurrent `get` calls from
/// data-loader workers are safe.
pub struct PairedImageDataset<B: Backend> {
    paths: Vec<PathBuf>,
    config: DatasetConfig,
    input_nc: usize,
    output_nc: usize,
    device: B::Device,
    seed: u64,
}

impl<B: Backend> PairedImageDataset<B> {
    /// Create a dataset from the configuration, seeding augmentation randomly.
    ///
    /// # Errors
    ///
    /// Fails if `<dataroot>/<phase>` is not a directory or if
    /// `load_size < crop_size`.
    pub fn new(config: DatasetConfig, device: &B::Device) -> DatasetResult<Self> {
        Self::with_seed(config, rand::random(), device)
    }

    /// Create a dataset with an explicit augmentation seed, for reproducible
    /// runs. Same construction contract as [`PairedImageDataset::new`].
    pub fn with_seed(config: DatasetConfig, seed: u64, device: &B::Device) -> DatasetResult<Self> {
        let dir = config.dataroot.join(&config.phase);
        let paths = image_folder::scan(&dir, config.max_dataset_size)?;

        if config.load_size < config.crop_size {
            return Err(DatasetError::InvalidSizeConfig {
                load_size: config.load_size,
                crop_size: config.crop_size,
            });
        }

        let (input_nc, output_nc) = config.effective_channels();

        println!("Found {} combined images in {}", paths.len(), dir.display());

        Ok(Self {
            paths,
            config,
            input_nc,
            output_nc,
            device: device.clone(),
            seed,
        })
    }

    /// Per-index RNG so augmentation is stable for an index and needs no
    /// shared mutable state across worker threads.
    fn create_rng(&self, index: usize) -> StdRng {
        StdRng::seed_from_u64(self.seed.wrapping_add(index as u64))
    }

    /// Split a combined image at the horizontal midpoint.
    ///
    /// Odd widths are tolerated: the right half ends up one pixel wider.
    fn split_pair(combined: &DynamicImage) -> (DynamicImage, DynamicImage) {
        let (w, h) = combined.dimensions();
        let w2 = w / 2;
        let a = combined.crop_imm(0, 0, w2, h);
        let b = combined.crop_imm(w2, 0, w - w2, h);
        (a, b)
    }

    /// Convert a transformed half to a [C, H, W] tensor scaled to [-1, 1].
    fn image_to_tensor(&self, img: DynamicImage, grayscale: bool) -> Tensor<B, 3> {
        let tensor = if grayscale {
            let img = img.to_luma32f();
            let (width, height) = img.dimensions();
            let data = TensorData::new(img.into_raw(), [height as usize, width as usize]);
            Tensor::<B, 2>::from_data(data, &self.device).unsqueeze::<3>()
        } else {
            let img = img.to_rgb32f();
            let (width, height) = img.dimensions();
            let data = TensorData::new(img.into_raw(), [height as usize, width as usize, 3]);
            // HWC to CHW
            Tensor::<B, 3>::from_data(data, &self.device).permute([2, 0, 1])
        };

        // [0, 1] -> [-1, 1], the range the generator trains against.
        tensor.sub_scalar(0.5).div_scalar(0.5)
    }
}

impl<B: Backend> Dataset<PairedItem<B>> for PairedImageDataset<B> {
    fn get(&self, index: usize) -> Option<PairedItem<B>> {
        let path = self.paths.get(index)?;

        let combined = match image::open(path) {
            Ok(img) => img,
            Err(e) => {
                eprintln!("Failed to open image {}: {}", path.display(), e);
                return None;
            }
        };

        // Force 3-channel color before splitting, whatever the source encoding.
        let combined = DynamicImage::ImageRgb8(combined.to_rgb8());
        let (a, b) = Self::split_pair(&combined);

        // One parameter draw keeps the random crop and flip identical on both
        // halves; only the grayscale conversion may differ.
        let mut rng = self.create_rng(index);
        let params = derive_params(&self.config, a.dimensions(), &mut rng);
        let a_transform = ImageTransform::new(&self.config, params, self.input_nc == 1);
        let b_transform = ImageTransform::new(&self.config, params, self.output_nc == 1);

        let a = self.image_to_tensor(a_transform.apply(a), self.input_nc == 1);
        let b = self.image_to_tensor(b_transform.apply(b), self.output_nc == 1);

        Some(PairedItem {
            a,
            b,
            a_path: path.clone(),
            b_path: path.clone(),
        })
    }

    fn len(&self) -> usize {
        self.paths.len()
    }
}
