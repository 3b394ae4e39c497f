use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tokio::fs;

use crate::error::Result;
use crate::generator::staging_path;
use crate::types::ParsedIdentity;

const STAGING_SUFFIX: &str = ".tmp";

/// Renders the ComicInfo document for a parsed identity.
///
/// The root `ComicInfo` element always carries a `Title` (possibly empty) and
/// carries an `Author` only when one was parsed. Text is XML-escaped.
pub fn render_comic_info(identity: &ParsedIdentity) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.get_mut().write_all(b"\n")?;

    writer.write_event(Event::Start(BytesStart::new("ComicInfo")))?;

    writer.write_event(Event::Start(BytesStart::new("Title")))?;
    writer.write_event(Event::Text(BytesText::new(&identity.title)))?;
    writer.write_event(Event::End(BytesEnd::new("Title")))?;

    if let Some(author) = &identity.author {
        writer.write_event(Event::Start(BytesStart::new("Author")))?;
        writer.write_event(Event::Text(BytesText::new(author)))?;
        writer.write_event(Event::End(BytesEnd::new("Author")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("ComicInfo")))?;
    writer.get_mut().write_all(b"\n")?;

    Ok(writer.into_inner().into_inner())
}

/// Writes the metadata sidecar into `output_dir` under `file_name`.
///
/// The document is written to `<file_name>.tmp` and renamed over the final
/// name once complete, replacing any previous sidecar. The temporary file
/// never outlives a failed write.
pub async fn write_comic_info(
    output_dir: &Path,
    file_name: &str,
    identity: &ParsedIdentity,
) -> Result<PathBuf> {
    let xml = render_comic_info(identity)?;

    let final_path = output_dir.join(file_name);
    let staged_path = staging_path(&final_path, STAGING_SUFFIX);

    if let Err(e) = fs::write(&staged_path, &xml).await {
        let _ = fs::remove_file(&staged_path).await;
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&staged_path, &final_path).await {
        let _ = fs::remove_file(&staged_path).await;
        return Err(e.into());
    }

    Ok(final_path)
}
