//! Tsuzuri - Folder to CBZ Batch Converter
//!
//! This crate turns a directory of per-title image folders into comic
//! archives. For every immediate subfolder of an input root it:
//!
//! 1. derives an author and title from the folder name (`[Author] Title`),
//! 2. writes a `ComicInfo.xml` sidecar,
//! 3. copies the cover page (`1`, `01`, `001` or `0001` with any recognized extension),
//! 4. bundles every page image into `<title>.cbz`.
//!
//! Progress is reported as a stream of human-readable log lines.
//!
//! # Getting Started
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use tsuzuri::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> tsuzuri::error::Result<()> {
//!     let config = ConverterConfig::builder()
//!         .input_root("./downloads")
//!         .output_root("./library")
//!         .compression(ArchiveCompression::Stored)
//!         .build()?;
//!
//!     // Run the batch in the background and print its progress as it happens
//!     let (handle, mut lines) = config.spawn();
//!     while let Some(line) = lines.next().await {
//!         println!("{}", line);
//!     }
//!
//!     let report = handle.wait().await?;
//!     println!("{} warning(s)", report.warning_count());
//!     Ok(())
//! }
//! ```

pub mod collector;
pub mod converter;
pub mod error;
pub mod generator;
pub mod identity;
pub mod path_utils;
pub mod progress;
pub mod types;

pub use converter::{BatchHandle, ConverterConfig, ConverterConfigBuilder};
pub use identity::parse_identity;
pub use progress::{LogLine, LogStream, ProgressLog};

// Re-export core types for direct access
pub use types::{
    ArchiveCompression, ArchiveOutcome, BatchReport, CoverCandidate, CoverOutcome, ImageEntry,
    ParsedIdentity, TitleUnit, UnitReport,
};

/// Prelude module for convenient imports.
///
/// Re-exports the most commonly used types, allowing you to import
/// everything you need with a single `use tsuzuri::prelude::*;` statement.
pub mod prelude {
    pub use super::{
        ArchiveCompression, ArchiveOutcome, BatchHandle, BatchReport, ConverterConfig,
        ConverterConfigBuilder, CoverCandidate, CoverOutcome, ImageEntry, LogLine, LogStream,
        ParsedIdentity, ProgressLog, TitleUnit, UnitReport, error, parse_identity, types,
    };
    pub use crate::collector::Collector;
    pub use std::path::{Path, PathBuf};
}
