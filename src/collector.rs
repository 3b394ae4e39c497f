//! Title unit and page image collection.
//!
//! This module enumerates the immediate subdirectories of the input root
//! (one per work), lists the recognized images inside each of them, and
//! finds the cover candidate by fixed basename and extension precedence.
//! Nested subfolders are never descended into.

use std::path::{Path, PathBuf};

use tokio::fs::{self, ReadDir, read_dir};

use crate::error::{Error, Result};
use crate::path_utils::get_file_name_lossy;
use crate::types::{
    COVER_BASENAMES, CoverCandidate, IMAGE_EXTENSIONS, ImageEntry, TitleUnit, is_recognized_image,
};

/// Enumerates title units below an input root.
#[derive(Debug)]
pub struct Collector<'a> {
    base_directory: &'a Path,
    excluded: Option<PathBuf>,
}

impl<'a> Collector<'a> {
    /// Creates a new Collector for the specified input root.
    pub fn new(base_directory: &'a Path) -> Self {
        Self {
            base_directory,
            excluded: None,
        }
    }

    /// Skips `path` during enumeration when it is an immediate subdirectory of
    /// the input root. Used to keep an output root nested in the input root
    /// from being treated as a work.
    pub fn excluding(mut self, path: &Path) -> Self {
        self.excluded = std::fs::canonicalize(path).ok();
        self
    }

    /// Collects the title units, sorted by folder name so the processing
    /// order is the same on every run.
    pub async fn collect_title_units(&self) -> Result<Vec<TitleUnit>> {
        let mut units = Vec::new();

        for path in Self::collect_entries(self.base_directory, true).await? {
            if let Some(excluded) = &self.excluded {
                if fs::canonicalize(&path).await.ok().as_ref() == Some(excluded) {
                    continue;
                }
            }
            units.push(TitleUnit {
                folder_name: get_file_name_lossy(&path),
                source_path: path,
            });
        }

        units.sort_by(|a, b| a.folder_name.cmp(&b.folder_name));
        Ok(units)
    }

    /// Lists the recognized images directly inside `directory`, sorted by
    /// file name in byte order.
    pub async fn collect_images(directory: &Path) -> Result<Vec<ImageEntry>> {
        let mut images: Vec<ImageEntry> = Self::collect_entries(directory, false)
            .await?
            .into_iter()
            .map(|path| ImageEntry {
                file_name: get_file_name_lossy(&path),
                path,
            })
            .filter(|entry| is_recognized_image(&entry.file_name))
            .collect();

        images.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(images)
    }

    /// Finds the cover image of a title unit.
    ///
    /// Basenames are tried in [`COVER_BASENAMES`] order, and for each one the
    /// extensions in [`IMAGE_EXTENSIONS`] order; the first regular file that
    /// exists wins. Absence is not an error.
    pub async fn locate_cover(directory: &Path) -> Option<CoverCandidate> {
        for basename in COVER_BASENAMES {
            for extension in IMAGE_EXTENSIONS {
                let path = directory.join(format!("{}.{}", basename, extension));
                if let Ok(metadata) = fs::metadata(&path).await {
                    if metadata.is_file() {
                        return Some(CoverCandidate { path, extension });
                    }
                }
            }
        }
        None
    }

    /// Collects directory contents with filtering options
    ///
    /// # Arguments
    ///
    /// * `directory` - Directory to scan
    /// * `only_dirs` - When true, only directories are collected; when false, only regular files
    ///
    /// # Returns
    ///
    /// * `Result<Vec<PathBuf>>` - Paths meeting the criteria, in listing order
    pub async fn collect_entries(directory: &Path, only_dirs: bool) -> Result<Vec<PathBuf>> {
        let mut entries: Vec<PathBuf> = Vec::new();

        let mut paths: ReadDir = read_dir(directory).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read directory '{}': {}", directory.display(), e),
            ))
        })?;

        while let Some(entry) = paths.next_entry().await? {
            let path = entry.path();
            // Follows symlinks, so linked folders and images count as their targets.
            let Ok(metadata) = fs::metadata(&path).await else {
                continue;
            };

            if (only_dirs && metadata.is_dir()) || (!only_dirs && metadata.is_file()) {
                entries.push(path);
            }
        }

        Ok(entries)
    }
}
