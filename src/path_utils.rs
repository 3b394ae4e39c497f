//! Path utilities for naming output files safely.
//!
//! Folder names and parsed titles flow straight into output file names, so
//! this module owns the rules that turn them into something every common
//! filesystem accepts: character replacement, trimming, the empty-name
//! fallback, and the 255-byte component limit.

use std::path::Path;

use crate::types::ARCHIVE_EXTENSION;

/// Maximum length in bytes of a single path component on common filesystems.
pub const MAX_FILE_NAME_BYTES: usize = 255;

/// Suffix of the temporary file an archive is written to before being renamed.
pub const ARCHIVE_STAGING_SUFFIX: &str = ".part";

/// Archive stem used when neither the title nor the folder name survives sanitization.
pub const FALLBACK_ARCHIVE_STEM: &str = "untitled";

/// Gets the file name from a path with fallback to lossy conversion.
pub fn get_file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Converts a path to a string with fallback to lossy conversion.
pub fn path_to_string_lossy(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Sanitizes a filename by replacing invalid characters with safe alternatives.
///
/// # Arguments
///
/// * `filename` - The filename to sanitize
///
/// # Returns
///
/// * `String` - The sanitized filename
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | '"' | '|' | '?' | '*' => '-',
            ':' => '-',
            '/' | '\\' => '-',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Truncates `s` to at most `max_bytes` bytes without splitting a character.
pub fn truncate_to_bytes(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn clean_stem(raw: &str) -> String {
    let sanitized = sanitize_filename(raw);
    sanitized
        .trim()
        .trim_end_matches('.')
        .trim_end()
        .to_string()
}

/// Chooses the archive file stem for a title unit.
///
/// The parsed title is sanitized and trimmed (including trailing dots). When
/// nothing is left, the folder name goes through the same treatment, and
/// [`FALLBACK_ARCHIVE_STEM`] is the last resort. The stem is cut so that
/// the staging name `<stem>.cbz.part` fits in [`MAX_FILE_NAME_BYTES`].
pub fn archive_file_stem(title: &str, folder_name: &str) -> String {
    let mut stem = clean_stem(title);
    if stem.is_empty() {
        stem = clean_stem(folder_name);
    }
    if stem.is_empty() {
        stem = FALLBACK_ARCHIVE_STEM.to_string();
    }

    let budget =
        MAX_FILE_NAME_BYTES - ARCHIVE_EXTENSION.len() - 1 - ARCHIVE_STAGING_SUFFIX.len();
    let truncated = truncate_to_bytes(&stem, budget).trim_end();
    if truncated.is_empty() {
        FALLBACK_ARCHIVE_STEM.to_string()
    } else {
        truncated.to_string()
    }
}

/// Full archive file name (`<stem>.cbz`) for a title unit.
pub fn archive_file_name(title: &str, folder_name: &str) -> String {
    format!("{}.{}", archive_file_stem(title, folder_name), ARCHIVE_EXTENSION)
}
