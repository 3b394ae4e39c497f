use crate::collector::Collector;
use crate::error::{Error, Result};
use crate::generator::staging_path;
use crate::path_utils::{ARCHIVE_STAGING_SUFFIX, path_to_string_lossy};
use crate::progress::ProgressLog;
use crate::types::{ARCHIVE_EXTENSION, ArchiveCompression, ArchiveOutcome, ImageEntry};
use memmap2::MmapOptions;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::task::spawn_blocking;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// A writer for CBZ (Comic Book ZIP) files.
///
/// Pages are stored under their original file names in the order they are
/// added, in a flat namespace. The archive is staged as `<stem>.cbz.part`
/// and only appears under its final name once [`Cbz::save`] succeeds.
pub struct Cbz {
    zip: Option<ZipWriter<File>>,
    options: SimpleFileOptions,
    staged_path: PathBuf,
    final_path: PathBuf,
    page_count: usize,
}

impl Cbz {
    /// Creates the staging file for `<output_dir>/<file_stem>.cbz`.
    pub fn new(output_dir: &Path, file_stem: &str, compression: ArchiveCompression) -> Result<Self> {
        let options: SimpleFileOptions = SimpleFileOptions::default()
            .compression_method(compression.into())
            .unix_permissions(0o644);

        let final_path = output_dir.join(format!("{}.{}", file_stem, ARCHIVE_EXTENSION));
        let staged_path = staging_path(&final_path, ARCHIVE_STAGING_SUFFIX);

        let file = File::create(&staged_path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create archive '{}': {}",
                    path_to_string_lossy(&staged_path),
                    e
                ),
            ))
        })?;

        Ok(Cbz {
            zip: Some(ZipWriter::new(file)),
            options,
            staged_path,
            final_path,
            page_count: 0,
        })
    }

    /// Final location of the archive.
    pub fn path(&self) -> &Path {
        &self.final_path
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Appends a page, copying the image bytes unchanged.
    pub async fn add_page(&mut self, image: &ImageEntry) -> Result<&mut Self> {
        let file = fs::File::open(&image.path).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to open image file '{}': {}",
                    path_to_string_lossy(&image.path),
                    e
                ),
            ))
        })?;
        let file_std = file.into_std().await;

        let mut zip = self
            .zip
            .take()
            .ok_or_else(|| Error::Other("Zip writer not available".to_string()))?;
        let entry_name = image.file_name.clone();
        let options = self.options;

        let (zip, written) = spawn_blocking(move || {
            let written = write_entry(&mut zip, entry_name, options, &file_std);
            (zip, written)
        })
        .await?;
        self.zip = Some(zip);
        written?;

        self.page_count += 1;
        Ok(self)
    }

    /// Finishes the central directory and moves the archive into place.
    pub async fn save(mut self) -> Result<PathBuf> {
        let zip = self
            .zip
            .take()
            .ok_or_else(|| Error::Other("Zip writer not available".to_string()))?;

        let finished = spawn_blocking(move || -> Result<()> {
            let file = zip.finish()?;
            file.sync_all()?;
            Ok(())
        })
        .await
        .map_err(Error::from)
        .and_then(|result| result);

        let moved = match finished {
            Ok(()) => fs::rename(&self.staged_path, &self.final_path)
                .await
                .map_err(Error::from),
            Err(e) => Err(e),
        };
        if let Err(e) = moved {
            let _ = fs::remove_file(&self.staged_path).await;
            return Err(e);
        }

        Ok(self.final_path)
    }

    /// Abandons the archive and removes the staging file.
    pub async fn discard(mut self) {
        drop(self.zip.take());
        let _ = fs::remove_file(&self.staged_path).await;
    }
}

fn write_entry(
    zip: &mut ZipWriter<File>,
    entry_name: String,
    options: SimpleFileOptions,
    file: &File,
) -> Result<()> {
    zip.start_file(entry_name, options)?;

    // Zero-length files cannot be memory mapped; their entry is simply empty.
    if file.metadata()?.len() == 0 {
        return Ok(());
    }

    // SAFETY: the map is read-only and dropped before this function returns;
    // source images are not expected to change while a batch runs.
    let mmap = unsafe { MmapOptions::new().map(file)? };
    zip.write_all(&mmap[..])?;
    Ok(())
}

/// Bundles every recognized image in `source_dir` into
/// `<output_dir>/<file_stem>.cbz`.
///
/// Returns [`ArchiveOutcome::Skipped`] without touching the output directory
/// when there is nothing to archive. On failure the staging file is removed
/// and the error is returned.
pub async fn build_archive(
    source_dir: &Path,
    output_dir: &Path,
    file_stem: &str,
    compression: ArchiveCompression,
    log: &ProgressLog,
) -> Result<ArchiveOutcome> {
    let images = Collector::collect_images(source_dir).await?;
    if images.is_empty() {
        return Ok(ArchiveOutcome::Skipped);
    }

    let mut cbz = Cbz::new(output_dir, file_stem, compression)?;
    log.info(format!(
        "Creating CBZ {} with {} image(s)...",
        cbz.path().display(),
        images.len()
    ));

    for image in &images {
        let added = cbz.add_page(image).await.map(|_| ());
        if let Err(e) = added {
            cbz.discard().await;
            return Err(e);
        }
    }

    let entries = cbz.page_count();
    let path = cbz.save().await?;
    Ok(ArchiveOutcome::Created { path, entries })
}
