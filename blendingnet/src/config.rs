//! Dataset configuration.
//!
//! All experiment knobs that affect data loading live here. The struct is a
//! Burn [`Config`], so it comes with generated `new`/`with_*` builders and
//! JSON save/load for experiment configs.

use std::path::PathBuf;

use burn::prelude::*;

/// Which half of a combined image is the network input.
///
/// The dataset always yields the left half as `a` and the right half as `b`;
/// the direction only swaps the effective channel counts so the consuming
/// model can reinterpret the pair.
#[derive(Config, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Left half is the input domain, right half is the target.
    AToB,
    /// Right half is the input domain, left half is the target.
    BToA,
}

/// Geometric preprocessing applied to each half after splitting.
#[derive(Config, Debug, PartialEq, Eq)]
pub enum Preprocess {
    /// Resize to `load_size x load_size`, then random-crop to `crop_size`.
    ResizeAndCrop,
    /// Random-crop to `crop_size` without resizing first.
    Crop,
    /// Scale the width to `load_size`, keeping the aspect ratio.
    ScaleWidth,
    /// Scale the width to `load_size`, then random-crop to `crop_size`.
    ScaleWidthAndCrop,
    /// Keep the original size, rounded to a multiple of 4.
    Keep,
}

/// Configuration for [`PairedImageDataset`](crate::PairedImageDataset).
///
/// Invariant: `load_size >= crop_size`. Violations are rejected when the
/// dataset is constructed, not here.
#[derive(Config, Debug)]
pub struct DatasetConfig {
    /// Root directory of the dataset; images are read from `<dataroot>/<phase>`.
    #[config(default = "PathBuf::from(\"datasets/blending\")")]
    pub dataroot: PathBuf,
    /// Dataset phase subdirectory (train, val, test).
    #[config(default = "String::from(\"train\")")]
    pub phase: String,
    /// Translation direction of the combined pairs.
    #[config(default = "Direction::AToB")]
    pub direction: Direction,
    /// Channel count expected by the network input.
    #[config(default = "3")]
    pub input_nc: usize,
    /// Channel count expected by the network target.
    #[config(default = "3")]
    pub output_nc: usize,
    /// Size images are scaled to before cropping.
    #[config(default = "286")]
    pub load_size: u32,
    /// Side length of the random crop window.
    #[config(default = "256")]
    pub crop_size: u32,
    /// Geometric preprocessing mode.
    #[config(default = "Preprocess::ResizeAndCrop")]
    pub preprocess: Preprocess,
    /// Upper bound on the number of images loaded from the phase directory.
    #[config(default = "usize::MAX")]
    pub max_dataset_size: usize,
    /// Disable the random horizontal flip.
    #[config(default = "false")]
    pub no_flip: bool,
}

impl DatasetConfig {
    /// Effective (input, output) channel counts after accounting for direction.
    pub fn effective_channels(&self) -> (usize, usize) {
        match self.direction {
            Direction::AToB => (self.input_nc, self.output_nc),
            Direction::BToA => (self.output_nc, self.input_nc),
        }
    }

    /// Rewrite defaults for mouth blending experiments.
    ///
    /// BlendingNet consumes width-scaled pairs with a 7-channel input
    /// (masked face crop plus guidance channels) and a 3-channel target.
    /// Flipping is only kept while training.
    pub fn for_blending(self, is_train: bool) -> Self {
        self.with_preprocess(Preprocess::ScaleWidth)
            .with_input_nc(7)
            .with_output_nc(3)
            .with_direction(Direction::AToB)
            .with_no_flip(!is_train)
    }
}
