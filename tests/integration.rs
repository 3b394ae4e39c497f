//! Integration tests for the Tsuzuri crate.
//!
//! These tests run whole batches from setup to output validation.

use futures::StreamExt;
use tokio::time::timeout;
use tsuzuri::error::{Error, Result};
use tsuzuri::prelude::*;

mod common;
use common::{
    TEST_TIMEOUT, archive_entry_names, create_file, create_page, dir_file_names, messages,
    read_archive_entry, setup_test_dirs,
};

fn config_for(input: &Path, output: &Path) -> Result<ConverterConfig> {
    Ok(ConverterConfig::builder()
        .input_root(input)
        .output_root(output)
        .build()?)
}

#[tokio::test]
async fn test_full_batch_two_units() -> Result<()> {
    let test_dirs = setup_test_dirs("full_batch").await;
    let story = test_dirs.input_dir.join("[Studio X] Great Story");
    let untitled = test_dirs.input_dir.join("Untitled Folder");

    // Pages created out of order on purpose.
    create_page(&story.join("03.jpg"), 30).await?;
    create_page(&story.join("01.jpg"), 10).await?;
    create_page(&story.join("02.jpg"), 20).await?;
    create_file(&untitled.join("notes.txt"), b"nothing to see").await?;

    let (log, mut stream) = ProgressLog::channel();
    let config = config_for(&test_dirs.input_dir, &test_dirs.output_dir)?;
    let report = timeout(TEST_TIMEOUT, config.run(&log))
        .await
        .expect("Test timed out")?;
    let lines = messages(&mut stream);

    assert_eq!(report.total_units, 2);
    assert_eq!(report.units.len(), 2);
    assert_eq!(report.warning_count(), 0);
    assert_eq!(report.archives_created(), 1);
    assert_eq!(report.covers_copied(), 1);
    assert!(!report.cancelled);

    // Titled unit
    let out = test_dirs.output_dir.join("[Studio X] Great Story");
    assert_eq!(
        dir_file_names(&out),
        vec!["ComicInfo.xml", "Great Story.cbz", "cover.jpg"]
    );

    let xml = tokio::fs::read_to_string(out.join("ComicInfo.xml")).await?;
    assert!(xml.contains("<Title>Great Story</Title>"));
    assert!(xml.contains("<Author>Studio X</Author>"));

    assert_eq!(
        tokio::fs::read(out.join("cover.jpg")).await?,
        tokio::fs::read(story.join("01.jpg")).await?
    );

    let archive = out.join("Great Story.cbz");
    assert_eq!(
        archive_entry_names(&archive),
        vec!["01.jpg", "02.jpg", "03.jpg"]
    );
    assert_eq!(
        read_archive_entry(&archive, "02.jpg"),
        tokio::fs::read(story.join("02.jpg")).await?
    );

    // Unit without any pages
    let out = test_dirs.output_dir.join("Untitled Folder");
    assert_eq!(dir_file_names(&out), vec!["ComicInfo.xml"]);
    let xml = tokio::fs::read_to_string(out.join("ComicInfo.xml")).await?;
    assert!(xml.contains("<Title>Untitled Folder</Title>"));
    assert!(!xml.contains("<Author>"));

    // Byte order puts "Untitled Folder" before "[Studio X] Great Story".
    let untitled_report = &report.units[0];
    assert_eq!(untitled_report.folder_name, "Untitled Folder");
    assert_eq!(report.units[1].folder_name, "[Studio X] Great Story");
    assert_eq!(untitled_report.cover, Some(CoverOutcome::NotFound));
    assert_eq!(untitled_report.archive, Some(ArchiveOutcome::Skipped));

    assert!(lines.contains(&"Processing 2 directories...".to_string()));
    assert!(lines.contains(&"Extracted author: Studio X".to_string()));
    assert!(lines.contains(&"Written ComicInfo.xml for Great Story".to_string()));
    assert!(lines.contains(&"No cover image found in Untitled Folder".to_string()));
    assert!(lines.contains(&"No image files found in Untitled Folder".to_string()));
    assert!(lines.iter().any(|l| l.starts_with("CBZ file created: ")));
    assert_eq!(
        lines.last().map(String::as_str),
        Some("Processing completed: 2 directories, 1 CBZ file(s) created, 0 warning(s).")
    );
    Ok(())
}

#[tokio::test]
async fn test_output_root_is_created() -> Result<()> {
    let test_dirs = setup_test_dirs("output_root_created").await;
    create_page(&test_dirs.input_dir.join("Work").join("1.png"), 5).await?;
    let nested_output = test_dirs.output_dir.join("deep").join("library");

    let (log, mut stream) = ProgressLog::channel();
    let report = config_for(&test_dirs.input_dir, &nested_output)?
        .run(&log)
        .await?;

    assert!(nested_output.is_dir());
    assert_eq!(report.archives_created(), 1);
    assert_eq!(
        dir_file_names(&nested_output.join("Work")),
        vec!["ComicInfo.xml", "Work.cbz", "cover.png"]
    );
    let expected = format!("Created directory: {}", nested_output.display());
    assert_eq!(messages(&mut stream).first(), Some(&expected));
    Ok(())
}

#[tokio::test]
async fn test_missing_input_root_is_fatal() -> Result<()> {
    let test_dirs = setup_test_dirs("missing_input_root").await;
    let missing = test_dirs.input_dir.join("does-not-exist");

    let (log, mut stream) = ProgressLog::channel();
    let result = config_for(&missing, &test_dirs.output_dir)?.run(&log).await;

    assert!(matches!(result, Err(Error::NotFound(_))));
    assert!(!test_dirs.output_dir.exists());

    let lines = stream.drain_pending();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].level, log::Level::Error);
    assert!(lines[0].message.contains("Input folder does not exist"));
    Ok(())
}

#[tokio::test]
async fn test_missing_output_root_without_creation_is_fatal() -> Result<()> {
    let test_dirs = setup_test_dirs("missing_output_root").await;
    tokio::fs::create_dir_all(test_dirs.input_dir.join("Work")).await?;

    let config = ConverterConfig::builder()
        .input_root(test_dirs.input_dir.clone())
        .output_root(test_dirs.output_dir.clone())
        .create_output_root(false)
        .build()?;
    let result = config.run(&ProgressLog::detached()).await;

    assert!(matches!(result, Err(Error::NotFound(_))));
    assert!(!test_dirs.output_dir.exists());
    Ok(())
}

#[tokio::test]
async fn test_failed_unit_does_not_stop_batch() -> Result<()> {
    let test_dirs = setup_test_dirs("failed_unit").await;
    create_page(&test_dirs.input_dir.join("A").join("01.jpg"), 1).await?;
    create_page(&test_dirs.input_dir.join("B").join("01.jpg"), 2).await?;

    // A regular file occupies the output directory of "A".
    create_file(&test_dirs.output_dir.join("A"), b"in the way").await?;

    let (log, mut stream) = ProgressLog::channel();
    let report = config_for(&test_dirs.input_dir, &test_dirs.output_dir)?
        .run(&log)
        .await?;
    let lines = stream.drain_pending();

    assert_eq!(report.units.len(), 2);
    assert_eq!(report.warning_count(), 1);

    let failed = &report.units[0];
    assert_eq!(failed.folder_name, "A");
    assert!(failed.is_failed());
    assert!(
        failed
            .error
            .as_deref()
            .unwrap_or_default()
            .starts_with("create output directory")
    );
    assert!(failed.metadata_path.is_none());
    assert!(failed.archive.is_none());

    assert!(!report.units[1].is_failed());
    assert_eq!(
        archive_entry_names(&test_dirs.output_dir.join("B").join("B.cbz")),
        vec!["01.jpg"]
    );

    let error_line = lines
        .iter()
        .find(|l| l.level == log::Level::Error)
        .expect("error line expected");
    assert!(
        error_line
            .message
            .starts_with("Unable to create output directory for A: ")
    );
    assert!(
        error_line
            .to_string()
            .starts_with("Error: Unable to create output directory for A: ")
    );
    Ok(())
}

#[tokio::test]
async fn test_failed_archive_keeps_earlier_outputs() -> Result<()> {
    let test_dirs = setup_test_dirs("failed_archive").await;
    create_page(&test_dirs.input_dir.join("[Me] Work").join("01.jpg"), 1).await?;
    create_page(&test_dirs.input_dir.join("[Me] Work").join("02.jpg"), 2).await?;
    create_page(&test_dirs.input_dir.join("[Me] Zzz").join("01.jpg"), 3).await?;

    // A directory sits where the finished archive of "[Me] Work" must go.
    let blocked = test_dirs.output_dir.join("[Me] Work");
    tokio::fs::create_dir_all(blocked.join("Work.cbz")).await?;

    let (log, mut stream) = ProgressLog::channel();
    let report = config_for(&test_dirs.input_dir, &test_dirs.output_dir)?
        .run(&log)
        .await?;
    let lines = stream.drain_pending();

    assert_eq!(report.units.len(), 2);
    assert_eq!(report.warning_count(), 1);

    let failed = &report.units[0];
    assert_eq!(failed.folder_name, "[Me] Work");
    assert!(
        failed
            .error
            .as_deref()
            .unwrap_or_default()
            .starts_with("create CBZ file: ")
    );
    assert!(failed.metadata_path.is_some());
    assert!(matches!(failed.cover, Some(CoverOutcome::Copied { .. })));
    assert!(failed.archive.is_none());

    // Metadata and cover stay, the staging file is gone, the obstacle is untouched.
    assert_eq!(
        dir_file_names(&blocked),
        vec!["ComicInfo.xml", "Work.cbz", "cover.jpg"]
    );
    assert!(blocked.join("Work.cbz").is_dir());
    assert!(dir_file_names(&blocked.join("Work.cbz")).is_empty());

    assert!(
        lines
            .iter()
            .any(|l| l.level == log::Level::Error
                && l.message.starts_with("Unable to create CBZ file for [Me] Work: "))
    );

    // The next unit still runs.
    assert!(!report.units[1].is_failed());
    assert_eq!(
        archive_entry_names(&test_dirs.output_dir.join("[Me] Zzz").join("Zzz.cbz")),
        vec!["01.jpg"]
    );
    Ok(())
}

#[tokio::test]
async fn test_output_root_inside_input_root_is_not_a_unit() -> Result<()> {
    let test_dirs = setup_test_dirs("nested_output_root").await;
    create_page(&test_dirs.input_dir.join("Work").join("01.jpg"), 7).await?;
    let output = test_dirs.input_dir.join("converted");

    let first = config_for(&test_dirs.input_dir, &output)?
        .run(&ProgressLog::detached())
        .await?;
    assert_eq!(first.total_units, 1);

    // A second run must not pick up the first run's output.
    let second = config_for(&test_dirs.input_dir, &output)?
        .run(&ProgressLog::detached())
        .await?;
    assert_eq!(second.total_units, 1);
    assert_eq!(second.units[0].folder_name, "Work");
    assert_eq!(dir_file_names(&output), vec!["Work"]);
    Ok(())
}

#[tokio::test]
async fn test_rerun_replaces_outputs() -> Result<()> {
    let test_dirs = setup_test_dirs("rerun").await;
    let work = test_dirs.input_dir.join("[Me] Work");
    create_page(&work.join("01.jpg"), 1).await?;

    config_for(&test_dirs.input_dir, &test_dirs.output_dir)?
        .run(&ProgressLog::detached())
        .await?;

    create_page(&work.join("02.jpg"), 2).await?;
    let report = config_for(&test_dirs.input_dir, &test_dirs.output_dir)?
        .run(&ProgressLog::detached())
        .await?;
    assert_eq!(report.warning_count(), 0);

    let out = test_dirs.output_dir.join("[Me] Work");
    assert_eq!(
        dir_file_names(&out),
        vec!["ComicInfo.xml", "Work.cbz", "cover.jpg"]
    );
    assert_eq!(
        archive_entry_names(&out.join("Work.cbz")),
        vec!["01.jpg", "02.jpg"]
    );
    Ok(())
}

#[tokio::test]
async fn test_deflated_archive_round_trips() -> Result<()> {
    let test_dirs = setup_test_dirs("deflated").await;
    let work = test_dirs.input_dir.join("Work");
    create_page(&work.join("a.png"), 40).await?;
    create_file(&work.join("b.webp"), b"RIFF\0\0\0\0WEBPVP8L").await?;
    create_file(&work.join("c.gif"), &[0u8; 4096]).await?;

    let config = ConverterConfig::builder()
        .input_root(test_dirs.input_dir.clone())
        .output_root(test_dirs.output_dir.clone())
        .compression(ArchiveCompression::Deflated)
        .build()?;
    config.run(&ProgressLog::detached()).await?;

    let archive = test_dirs.output_dir.join("Work").join("Work.cbz");
    assert_eq!(
        archive_entry_names(&archive),
        vec!["a.png", "b.webp", "c.gif"]
    );
    for name in ["a.png", "b.webp", "c.gif"] {
        assert_eq!(
            read_archive_entry(&archive, name),
            tokio::fs::read(work.join(name)).await?
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_units_processed_in_name_order() -> Result<()> {
    let test_dirs = setup_test_dirs("unit_order").await;
    for name in ["delta", "Alpha", "charlie", "Bravo"] {
        tokio::fs::create_dir_all(test_dirs.input_dir.join(name)).await?;
    }

    let report = config_for(&test_dirs.input_dir, &test_dirs.output_dir)?
        .run(&ProgressLog::detached())
        .await?;

    let names: Vec<&str> = report
        .units
        .iter()
        .map(|u| u.folder_name.as_str())
        .collect();
    assert_eq!(names, vec!["Alpha", "Bravo", "charlie", "delta"]);
    Ok(())
}

#[tokio::test]
async fn test_spawned_batch_streams_progress() -> Result<()> {
    let test_dirs = setup_test_dirs("spawned_batch").await;
    create_page(&test_dirs.input_dir.join("(Circle) Tale").join("001.jpg"), 3).await?;

    let (handle, stream) = config_for(&test_dirs.input_dir, &test_dirs.output_dir)?.spawn();
    let lines: Vec<LogLine> = timeout(TEST_TIMEOUT, stream.collect())
        .await
        .expect("Test timed out");
    let report = handle.wait().await?;

    assert_eq!(report.archives_created(), 1);
    let expected = format!("Created directory: {}", test_dirs.output_dir.display());
    assert_eq!(lines.first().map(|l| l.message.clone()), Some(expected));
    assert!(lines.iter().all(|l| l.level == log::Level::Info));
    assert!(
        lines
            .iter()
            .any(|l| l.message == "Extracted author: Circle")
    );
    assert!(
        test_dirs
            .output_dir
            .join("(Circle) Tale")
            .join("cover.jpg")
            .is_file()
    );
    Ok(())
}

#[tokio::test]
async fn test_cancel_before_first_unit() -> Result<()> {
    let test_dirs = setup_test_dirs("cancel_batch").await;
    create_page(&test_dirs.input_dir.join("One").join("01.jpg"), 1).await?;
    create_page(&test_dirs.input_dir.join("Two").join("01.jpg"), 2).await?;

    let (handle, stream) = config_for(&test_dirs.input_dir, &test_dirs.output_dir)?.spawn();
    // The test runtime is single-threaded, so the batch has not started yet.
    handle.cancel();

    let lines: Vec<LogLine> = timeout(TEST_TIMEOUT, stream.collect())
        .await
        .expect("Test timed out");
    let report = handle.wait().await?;

    assert!(report.cancelled);
    assert!(report.units.is_empty());
    assert_eq!(report.total_units, 2);
    assert!(
        lines
            .iter()
            .any(|l| l.level == log::Level::Warn
                && l.message == "Cancelled after 0 of 2 directories.")
    );
    assert!(dir_file_names(&test_dirs.output_dir).is_empty());
    Ok(())
}
