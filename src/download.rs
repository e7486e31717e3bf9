//! Output naming helpers.
//!
//! Chapter documents land in the output directory as `Chapter_{key}.{ext}`,
//! with every path component passed through [`sanitize_filename`].

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

use crate::types::ChapterKey;

static RESERVED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\/*?:"<>|\x00-\x1f]"#).expect("valid reserved-character pattern"));

/// Longest file name we produce, in bytes.
const MAX_NAME_LEN: usize = 200;

/// Replaces characters that are not allowed in file names with `_`.
///
/// Leading and trailing whitespace is trimmed, names are cut to 200 bytes on a
/// character boundary, and an empty result becomes `untitled`.
///
/// ```rust
/// use shuroku::download::sanitize_filename;
///
/// assert_eq!(sanitize_filename("Re:Zero / Arc 1?"), "Re_Zero _ Arc 1_");
/// assert_eq!(sanitize_filename("   "), "untitled");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let replaced = RESERVED.replace_all(name.trim(), "_");
    let mut sanitized = replaced.trim().to_string();

    if sanitized.len() > MAX_NAME_LEN {
        let mut cut = MAX_NAME_LEN;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
    }

    if sanitized.is_empty() {
        sanitized = "untitled".to_string();
    }
    sanitized
}

/// Extracts a lowercase file extension from a file name or URL.
///
/// Query strings and fragments are ignored.
///
/// ```rust
/// use shuroku::download::extract_extension;
///
/// assert_eq!(extract_extension("x1-4f3a.PNG"), Some("png".to_string()));
/// assert_eq!(extract_extension("https://example.com/p.jpg?v=2"), Some("jpg".to_string()));
/// assert_eq!(extract_extension("https://example.com/page"), None);
/// ```
pub fn extract_extension(name: &str) -> Option<String> {
    let clean = name.split(['?', '#']).next()?;
    let file = clean.rsplit('/').next()?;
    let (_, ext) = file.rsplit_once('.')?;

    if ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Path of the document assembled for `key`.
///
/// ```rust
/// use shuroku::download::artifact_path;
/// use shuroku::types::ChapterKey;
/// use std::path::Path;
///
/// let key = ChapterKey::parse("12.50").unwrap();
/// assert_eq!(
///     artifact_path(Path::new("out"), &key, "cbz"),
///     Path::new("out/Chapter_12.5.cbz"),
/// );
/// ```
pub fn artifact_path(output_dir: &Path, key: &ChapterKey, extension: &str) -> PathBuf {
    output_dir.join(sanitize_filename(&format!("Chapter_{}.{}", key, extension)))
}

/// Default output directory for a work: `downloads/{sanitized title}`.
pub fn default_output_dir(title: &str) -> PathBuf {
    Path::new("downloads").join(sanitize_filename(title))
}
