//! Core data types, outcomes and reports for the Tsuzuri batch converter.
//!
//! This module defines the fundamental data structures used throughout Tsuzuri:
//! - Fixed recognition tables (`IMAGE_EXTENSIONS`, `COVER_BASENAMES`)
//! - Input entities (`TitleUnit`, `ImageEntry`, `CoverCandidate`)
//! - The identity derived from a folder name (`ParsedIdentity`)
//! - Per-step outcomes (`CoverOutcome`, `ArchiveOutcome`)
//! - Reporting types (`UnitReport`, `BatchReport`)
//! - Archive settings (`ArchiveCompression`)

use chrono::{DateTime, Local};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Recognized image extensions, in cover lookup precedence order.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "gif"];

/// Basenames tried, in order, when looking for a cover image.
pub const COVER_BASENAMES: [&str; 4] = ["1", "01", "001", "0001"];

/// Extension given to every generated archive.
pub const ARCHIVE_EXTENSION: &str = "cbz";

/// Default name of the metadata sidecar written into each output unit.
pub const DEFAULT_METADATA_FILE_NAME: &str = "ComicInfo.xml";

/// Returns `true` when `file_name` ends with one of the recognized image
/// extensions, ignoring ASCII case.
pub fn is_recognized_image(file_name: &str) -> bool {
    let lowered = file_name.to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .any(|ext| lowered.ends_with(&format!(".{}", ext)))
}

/// One immediate subdirectory of the input root, representing a single work.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TitleUnit {
    /// Directory name as found on disk (lossy for non-UTF-8 names).
    pub folder_name: String,
    /// Absolute or input-root-relative path of the directory.
    pub source_path: PathBuf,
}

/// A recognized image file directly inside a title unit's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImageEntry {
    /// Basename, used verbatim as the in-archive entry name.
    pub file_name: String,
    pub path: PathBuf,
}

/// Author and title derived from a folder name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParsedIdentity {
    pub author: Option<String>,
    pub title: String,
}

/// The image chosen as cover by basename and extension precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverCandidate {
    pub path: PathBuf,
    /// Extension exactly as listed in [`IMAGE_EXTENSIONS`].
    pub extension: &'static str,
}

impl CoverCandidate {
    /// File name the cover receives inside the output unit (`cover.<ext>`).
    pub fn output_file_name(&self) -> String {
        format!("cover.{}", self.extension)
    }
}

/// Result of the cover step for one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CoverOutcome {
    Copied { source: PathBuf, destination: PathBuf },
    NotFound,
}

/// Result of the archive step for one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ArchiveOutcome {
    Created { path: PathBuf, entries: usize },
    /// The source directory held no recognized images.
    Skipped,
}

/// Compression applied to archive entries. Bytes are never re-encoded either way.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ArchiveCompression {
    #[default]
    Stored,
    Deflated,
}

impl From<ArchiveCompression> for zip::CompressionMethod {
    fn from(compression: ArchiveCompression) -> Self {
        match compression {
            ArchiveCompression::Stored => zip::CompressionMethod::Stored,
            ArchiveCompression::Deflated => zip::CompressionMethod::Deflated,
        }
    }
}

/// What happened to a single title unit.
///
/// Steps run in a fixed order (directory, metadata, cover, archive). When a
/// step fails, `error` is set and the later steps are left as `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UnitReport {
    pub folder_name: String,
    pub output_dir: PathBuf,
    pub identity: ParsedIdentity,
    pub metadata_path: Option<PathBuf>,
    pub cover: Option<CoverOutcome>,
    pub archive: Option<ArchiveOutcome>,
    pub error: Option<String>,
}

impl UnitReport {
    pub(crate) fn new(unit: &TitleUnit, output_dir: &Path, identity: ParsedIdentity) -> Self {
        Self {
            folder_name: unit.folder_name.clone(),
            output_dir: output_dir.to_path_buf(),
            identity,
            metadata_path: None,
            cover: None,
            archive: None,
            error: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Summary of a whole batch run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BatchReport {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub units: Vec<UnitReport>,
    /// Number of units enumerated, including any not reached after cancellation.
    pub total_units: usize,
    pub cancelled: bool,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl BatchReport {
    /// Units that failed; each one counts as a warning in the final summary.
    pub fn failed_units(&self) -> impl Iterator<Item = &UnitReport> {
        self.units.iter().filter(|u| u.is_failed())
    }

    pub fn warning_count(&self) -> usize {
        self.failed_units().count()
    }

    pub fn archives_created(&self) -> usize {
        self.units
            .iter()
            .filter(|u| matches!(u.archive, Some(ArchiveOutcome::Created { .. })))
            .count()
    }

    pub fn covers_copied(&self) -> usize {
        self.units
            .iter()
            .filter(|u| matches!(u.cover, Some(CoverOutcome::Copied { .. })))
            .count()
    }
}
