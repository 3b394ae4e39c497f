use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Local;
use tokio::fs;
use tokio::task::JoinHandle;

use crate::collector::Collector;
use crate::error::{Error, Result};
use crate::generator::{build_archive, copy_cover, write_comic_info};
use crate::identity::parse_identity;
use crate::path_utils::archive_file_stem;
use crate::progress::{LogStream, ProgressLog};
use crate::types::{
    ArchiveCompression, ArchiveOutcome, BatchReport, CoverOutcome, DEFAULT_METADATA_FILE_NAME,
    TitleUnit, UnitReport,
};

/// Configuration of a batch conversion, built declaratively using the builder pattern.
///
/// A batch walks the immediate subdirectories of `input_root` and, for each
/// one, creates an output directory of the same name under `output_root`
/// holding a `ComicInfo.xml` sidecar, a `cover.<ext>` copy and a
/// `<title>.cbz` archive of every page image.
///
/// ## Builder Pattern
///
/// ```rust,no_run
/// # use tsuzuri::prelude::*;
/// # #[tokio::main]
/// # async fn main() -> tsuzuri::error::Result<()> {
/// let config = ConverterConfig::builder()
///     .input_root("./downloads")
///     .output_root("./library")
///     .build()?;
///
/// let report = config.run(&ProgressLog::detached()).await?;
/// println!("{} archive(s) created", report.archives_created());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, derive_builder::Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ConverterConfig {
    /// Directory whose immediate subdirectories are the works to convert.
    #[builder(default)]
    pub input_root: PathBuf,

    /// Directory receiving one output subdirectory per work.
    #[builder(default)]
    pub output_root: PathBuf,

    /// Whether a missing output root (and its parents) is created.
    ///
    /// If `false`, a missing output root aborts the batch.
    #[builder(default = "true")]
    pub create_output_root: bool,

    /// Compression applied to archive entries.
    ///
    /// - [`ArchiveCompression::Stored`]: entries are stored as-is (images are already compressed)
    /// - [`ArchiveCompression::Deflated`]: entries are deflated
    #[builder(default)]
    pub compression: ArchiveCompression,

    /// File name of the metadata sidecar written into each output directory.
    #[builder(default = "DEFAULT_METADATA_FILE_NAME.to_string()")]
    pub metadata_file_name: String,
}

/// The per-unit steps, in the order they run.
#[derive(Debug, Clone, Copy)]
enum Step {
    OutputDirectory,
    Metadata,
    Cover,
    Archive,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::OutputDirectory => "create output directory",
            Step::Metadata => "write metadata",
            Step::Cover => "copy cover",
            Step::Archive => "create CBZ file",
        })
    }
}

impl ConverterConfig {
    /// Creates a new builder for configuring `ConverterConfig`.
    pub fn builder() -> ConverterConfigBuilder {
        ConverterConfigBuilder::default()
    }

    /// Validates the configuration against the filesystem without writing anything.
    ///
    /// All run methods call this first; a failure here is the only way a batch
    /// aborts as a whole, apart from an unusable output root.
    pub fn preflight_check(&self) -> Result<&Self> {
        if self.input_root.as_os_str().is_empty() || self.output_root.as_os_str().is_empty() {
            return Err(Error::Other(
                "Please select both input and output directories.".to_string(),
            ));
        }
        if !self.input_root.exists() {
            return Err(Error::NotFound(format!(
                "Input folder does not exist: {:?}",
                self.input_root
            )));
        }
        if !self.input_root.is_dir() {
            return Err(Error::InvalidPath(
                self.input_root.clone(),
                "Input path is not a directory.".to_string(),
            ));
        }
        if !self.create_output_root && !self.output_root.is_dir() {
            return Err(Error::NotFound(format!(
                "Output folder does not exist: {:?}",
                self.output_root
            )));
        }
        Ok(self)
    }

    /// Runs the whole batch to completion.
    ///
    /// Per-unit failures are logged and recorded in the returned
    /// [`BatchReport`]; `Err` is only returned when the batch cannot start.
    pub async fn run(&self, log: &ProgressLog) -> Result<BatchReport> {
        self.run_with_cancel(log, &AtomicBool::new(false)).await
    }

    /// Runs the batch, checking `cancel` before each unit.
    ///
    /// A unit that has started always finishes; setting the flag stops the
    /// batch before the next one and marks the report as cancelled.
    pub async fn run_with_cancel(
        &self,
        log: &ProgressLog,
        cancel: &AtomicBool,
    ) -> Result<BatchReport> {
        let started_at = Local::now();

        let units = match self.prepare(log).await {
            Ok(units) => units,
            Err(e) => {
                log.error(e.to_string());
                return Err(e);
            }
        };

        log.info(format!("Processing {} directories...", units.len()));

        let mut reports = Vec::with_capacity(units.len());
        let mut cancelled = false;
        for unit in &units {
            if cancel.load(Ordering::SeqCst) {
                cancelled = true;
                log.warn(format!(
                    "Cancelled after {} of {} directories.",
                    reports.len(),
                    units.len()
                ));
                break;
            }
            reports.push(self.process_unit(unit, log).await);
        }

        let report = BatchReport {
            input_root: self.input_root.clone(),
            output_root: self.output_root.clone(),
            units: reports,
            total_units: units.len(),
            cancelled,
            started_at,
            finished_at: Local::now(),
        };

        log.info(format!(
            "Processing completed: {} directories, {} CBZ file(s) created, {} warning(s).",
            report.units.len(),
            report.archives_created(),
            report.warning_count()
        ));

        Ok(report)
    }

    /// Runs the batch on a background task.
    ///
    /// Returns a handle to await or cancel the batch, and the stream of its
    /// log lines, which ends when the batch does. Must be called from within
    /// a Tokio runtime.
    pub fn spawn(self) -> (BatchHandle, LogStream) {
        let (log, stream) = ProgressLog::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);

        let task = tokio::spawn(async move { self.run_with_cancel(&log, &flag).await });

        (BatchHandle { task, cancel }, stream)
    }

    /// Pre-flight, output root creation and title unit enumeration.
    async fn prepare(&self, log: &ProgressLog) -> Result<Vec<TitleUnit>> {
        self.preflight_check()?;

        if !self.output_root.is_dir() {
            fs::create_dir_all(&self.output_root).await.map_err(|e| {
                Error::InvalidPath(
                    self.output_root.clone(),
                    format!("Cannot create output folder: {}", e),
                )
            })?;
            log.info(format!("Created directory: {}", self.output_root.display()));
        }

        Collector::new(&self.input_root)
            .excluding(&self.output_root)
            .collect_title_units()
            .await
    }

    /// Converts one title unit, never failing the batch.
    async fn process_unit(&self, unit: &TitleUnit, log: &ProgressLog) -> UnitReport {
        let output_dir = match unit.source_path.file_name() {
            Some(name) => self.output_root.join(name),
            None => self.output_root.join(&unit.folder_name),
        };
        let identity = parse_identity(&unit.folder_name);
        let mut report = UnitReport::new(unit, &output_dir, identity);

        if let Err((step, e)) = self.convert_unit(unit, &mut report, log).await {
            log.error(format!("Unable to {} for {}: {}", step, unit.folder_name, e));
            report.error = Some(format!("{}: {}", step, e));
        }

        report
    }

    async fn convert_unit(
        &self,
        unit: &TitleUnit,
        report: &mut UnitReport,
        log: &ProgressLog,
    ) -> std::result::Result<(), (Step, Error)> {
        let output_dir = report.output_dir.clone();

        // 1. Output directory
        let exists = fs::metadata(&output_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !exists {
            fs::create_dir_all(&output_dir)
                .await
                .map_err(|e| (Step::OutputDirectory, Error::from(e)))?;
            log.info(format!("Created directory: {}", output_dir.display()));
        }

        // 2. Metadata
        if let Some(author) = &report.identity.author {
            log.info(format!("Extracted author: {}", author));
        }
        let metadata_path =
            write_comic_info(&output_dir, &self.metadata_file_name, &report.identity)
                .await
                .map_err(|e| (Step::Metadata, e))?;
        log.info(format!(
            "Written {} for {}",
            self.metadata_file_name, report.identity.title
        ));
        report.metadata_path = Some(metadata_path);

        // 3. Cover
        let cover = match Collector::locate_cover(&unit.source_path).await {
            Some(candidate) => {
                let destination = copy_cover(&candidate, &output_dir)
                    .await
                    .map_err(|e| (Step::Cover, e))?;
                log.info(format!(
                    "Copied and renamed {} to {}",
                    candidate.path.display(),
                    destination.display()
                ));
                CoverOutcome::Copied {
                    source: candidate.path,
                    destination,
                }
            }
            None => {
                log.info(format!("No cover image found in {}", unit.folder_name));
                CoverOutcome::NotFound
            }
        };
        report.cover = Some(cover);

        // 4. Archive
        let stem = archive_file_stem(&report.identity.title, &unit.folder_name);
        let archive = build_archive(&unit.source_path, &output_dir, &stem, self.compression, log)
            .await
            .map_err(|e| (Step::Archive, e))?;
        match &archive {
            ArchiveOutcome::Created { path, .. } => {
                log.info(format!("CBZ file created: {}", path.display()));
            }
            ArchiveOutcome::Skipped => {
                log.info(format!("No image files found in {}", unit.folder_name));
            }
        }
        report.archive = Some(archive);

        Ok(())
    }
}

impl ConverterConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(name) = &self.metadata_file_name {
            if name.is_empty() {
                return Err("Metadata file name must not be empty.".to_string());
            }
            if name.contains(['/', '\\']) {
                return Err(format!(
                    "Metadata file name must not contain a path separator: {}",
                    name
                ));
            }
        }
        Ok(())
    }
}

/// Handle to a batch started with [`ConverterConfig::spawn`].
#[derive(Debug)]
pub struct BatchHandle {
    task: JoinHandle<Result<BatchReport>>,
    cancel: Arc<AtomicBool>,
}

impl BatchHandle {
    /// Asks the batch to stop once the unit in progress is finished.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// A flag that cancels the batch when set, for use from other tasks.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the batch and returns its report.
    pub async fn wait(self) -> Result<BatchReport> {
        self.task.await?
    }
}
