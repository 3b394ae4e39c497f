//! Common test utilities and constants for the Tsuzuri crate.
//!
//! Provides functions for setting up test directories, creating real image
//! files, and reading generated archives back.

use image::{Rgb, RgbImage};
use rand::{Rng, distributions::Alphanumeric};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tsuzuri::error::{Error, Result};
use tsuzuri::{LogLine, LogStream};

#[allow(dead_code)]
pub const TEST_TMP_DIR: &str = "tests/tmp";
#[allow(dead_code)]
pub const TEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-test directory layout.
#[allow(dead_code)]
pub struct TestDirs {
    pub base_dir: PathBuf,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

/// Creates a unique, empty test directory with an `input` subdirectory.
/// The `output` directory is not created so tests can observe its creation.
#[allow(dead_code)]
pub async fn setup_test_dirs(sub_path: &str) -> TestDirs {
    let rand_string: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let base_dir = PathBuf::from(TEST_TMP_DIR).join(format!("{}-{}", sub_path, rand_string));
    if base_dir.exists() {
        fs::remove_dir_all(&base_dir).await.unwrap();
    }
    let input_dir = base_dir.join("input");
    let output_dir = base_dir.join("output");
    fs::create_dir_all(&input_dir).await.unwrap();

    TestDirs {
        base_dir,
        input_dir,
        output_dir,
    }
}

/// Creates a small solid-color image, encoded according to the path's extension.
#[allow(dead_code)]
pub async fn create_image(path: &Path, color: Rgb<u8>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let mut img = RgbImage::new(16, 16);
    for pixel in img.pixels_mut() {
        *pixel = color;
    }
    let path_clone = path.to_path_buf();
    tokio::task::spawn_blocking(move || img.save(path_clone))
        .await?
        .map_err(|e| Error::Other(e.to_string()))?;
    Ok(())
}

/// Creates a JPEG page whose color depends on `seed`, so pages differ byte-wise.
#[allow(dead_code)]
pub async fn create_page(path: &Path, seed: u8) -> Result<()> {
    create_image(path, Rgb([seed, 255 - seed, seed / 2])).await
}

/// Writes arbitrary bytes, for files whose content does not need to be an image.
#[allow(dead_code)]
pub async fn create_file(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, content).await?;
    Ok(())
}

/// Returns the entry names of a zip archive in stored order.
#[allow(dead_code)]
pub fn archive_entry_names(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

/// Reads one entry of a zip archive.
#[allow(dead_code)]
pub fn read_archive_entry(path: &Path, name: &str) -> Vec<u8> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut content = Vec::new();
    entry.read_to_end(&mut content).unwrap();
    content
}

/// Lists the names of the files inside a directory, sorted.
#[allow(dead_code)]
pub fn dir_file_names(path: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(path)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

/// Collects the messages buffered in a log stream.
#[allow(dead_code)]
pub fn messages(stream: &mut LogStream) -> Vec<String> {
    stream
        .drain_pending()
        .into_iter()
        .map(|line: LogLine| line.message)
        .collect()
}
