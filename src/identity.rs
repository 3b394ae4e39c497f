//! Derives the author and title of a work from its folder name.
//!
//! Folder names conventionally carry the circle or author as a bracketed
//! prefix, e.g. `[Studio X] Great Story` or `(Circle) Title`. The prefix
//! becomes the author and the remainder the title; names without a prefix
//! are used verbatim as the title.

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::ParsedIdentity;

lazy_static! {
    /// Matches an optional run of leading whitespace, a `[...]` or `(...)` group
    /// closed by the first bracket of the same kind, and any trailing text.
    pub static ref BRACKET_PREFIX_REGEX: Regex =
        Regex::new(r"(?s)^\s*(?:\[(?P<square>.*?)\]|\((?P<round>.*?)\))(?P<title>.*)$").unwrap();
}

/// Splits a folder name into author and title.
///
/// Never fails. An empty bracket group (`[] Title`) yields no author but
/// still strips the prefix from the title.
///
/// ```
/// use tsuzuri::identity::parse_identity;
///
/// let identity = parse_identity("[Studio X] Great Story");
/// assert_eq!(identity.author.as_deref(), Some("Studio X"));
/// assert_eq!(identity.title, "Great Story");
///
/// let identity = parse_identity("Untitled Folder");
/// assert_eq!(identity.author, None);
/// assert_eq!(identity.title, "Untitled Folder");
/// ```
pub fn parse_identity(folder_name: &str) -> ParsedIdentity {
    let Some(caps) = BRACKET_PREFIX_REGEX.captures(folder_name) else {
        return ParsedIdentity {
            author: None,
            title: folder_name.to_string(),
        };
    };

    let author = caps
        .name("square")
        .or_else(|| caps.name("round"))
        .map(|m| m.as_str().trim())
        .filter(|a| !a.is_empty())
        .map(str::to_string);
    let title = caps
        .name("title")
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    ParsedIdentity { author, title }
}
