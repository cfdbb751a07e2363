//! Error types for dataset construction.
//!
//! Retrieval-time failures (a corrupt or unreadable image) are not part of
//! this taxonomy: they surface through the `Option` returned by
//! `Dataset::get`, where the consuming loop decides whether to skip or abort.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for dataset construction and path discovery.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Error when the configured sizes cannot produce a valid crop.
    ///
    /// The loaded image must be at least as large as the crop window.
    #[error("load_size ({load_size}) must be >= crop_size ({crop_size})")]
    InvalidSizeConfig {
        /// The configured load size.
        load_size: u32,
        /// The configured crop size.
        crop_size: u32,
    },

    /// Error when the image directory is missing or not a directory.
    #[error("Image directory not found: {path}")]
    ImageDirectoryNotFound {
        /// The expected image directory path.
        path: PathBuf,
    },

    /// Error when walking the image directory fails.
    #[error("Failed to read directory: {path}")]
    DirectoryReadFailed {
        /// The directory path that failed to read.
        path: PathBuf,
        /// The underlying walk error.
        #[source]
        source: walkdir::Error,
    },
}

/// A specialized `Result` type for dataset operations.
pub type DatasetResult<T> = Result<T, DatasetError>;
