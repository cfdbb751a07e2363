//! Combined-image discovery on disk.
//!
//! The dataset consumes a flat-or-nested directory of image files, one
//! double-width image per sample. Discovery walks the whole tree so phase
//! directories may group files into subfolders (per identity, per clip).

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{DatasetError, DatasetResult};

/// Extensions the loader will attempt to decode (case-insensitive).
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// Whether a path looks like a decodable image file.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Collect up to `max_count` image paths under `dir`, sorted lexicographically.
///
/// An empty directory is not an error; the resulting dataset is just empty.
pub fn scan(dir: &Path, max_count: usize) -> DatasetResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(DatasetError::ImageDirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|e| DatasetError::DirectoryReadFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;
        if entry.file_type().is_file() && is_image_file(entry.path()) {
            paths.push(entry.into_path());
        }
    }

    paths.sort();
    paths.truncate(max_count);
    Ok(paths)
}
