//! Writers for the files that make up an output unit.
//!
//! - [`comic_info`] writes the `ComicInfo.xml` metadata sidecar.
//! - [`cover`] copies the cover page as `cover.<ext>`.
//! - [`cbz`] bundles page images into a zip-based `.cbz` archive.
//!
//! The metadata and archive writers into a temporary sibling first and rename it into place, so a
//! reader never observes a half-written file under the final name.

use std::path::{Path, PathBuf};

pub mod cbz;
pub mod comic_info;
pub mod cover;

pub use cbz::{Cbz, build_archive};
pub use comic_info::{render_comic_info, write_comic_info};
pub use cover::copy_cover;

/// Path of the temporary sibling a file is staged in before being renamed.
pub(crate) fn staging_path(final_path: &Path, suffix: &str) -> PathBuf {
    let mut name = final_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    final_path.with_file_name(name)
}
