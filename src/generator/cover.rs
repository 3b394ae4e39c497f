use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::{Error, Result};
use crate::path_utils::path_to_string_lossy;
use crate::types::CoverCandidate;

/// Copies the cover candidate into `output_dir` as `cover.<ext>`.
///
/// The bytes are copied unchanged and an existing cover of the same name is
/// replaced. Returns the destination path.
pub async fn copy_cover(candidate: &CoverCandidate, output_dir: &Path) -> Result<PathBuf> {
    let destination = output_dir.join(candidate.output_file_name());

    fs::copy(&candidate.path, &destination).await.map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!(
                "Failed to copy cover '{}': {}",
                path_to_string_lossy(&candidate.path),
                e
            ),
        ))
    })?;

    Ok(destination)
}
