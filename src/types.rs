//! Core data types shared by the catalog, ranking and acquisition layers.
//!
//! - [`ChapterRecord`] - One chapter upload as listed by the remote catalog
//! - [`ChapterKey`] - Canonical numeric identity of a chapter
//! - [`Group`] - A scanlation group credited on an upload
//! - [`CandidateEntry`] - One group's version of one chapter
//! - [`AssetManifest`] / [`AssetTask`] - The pages of one upload and how to fetch them
//! - [`ChapterOutcome`] - Terminal result of acquiring one chapter
//!
//! # Examples
//!
//! ```rust
//! use shuroku::types::ChapterKey;
//!
//! let a = ChapterKey::parse("10").unwrap();
//! let b = ChapterKey::parse("10.0").unwrap();
//! assert_eq!(a, b);
//! assert_eq!(a.to_string(), "10");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A scanlation group credited on a chapter upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Group {
    /// Remote identifier of the group
    pub id: String,

    /// Display name; falls back to the id when the remote omits it
    pub name: String,
}

impl Group {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Sentinel used for uploads that credit no group at all.
    ///
    /// ```rust
    /// use shuroku::types::Group;
    ///
    /// assert_eq!(Group::unknown().name, "Unknown Group");
    /// ```
    pub fn unknown() -> Self {
        Self::new("unknown", "Unknown Group")
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// One chapter upload as listed by the remote catalog.
///
/// Several records may describe the same chapter when more than one group
/// translated it. Records are immutable once fetched.
///
/// # Fields
///
/// * `id` - Opaque remote identifier, used to resolve the page manifest
/// * `chapter` - Raw chapter number as published (may be missing or not numeric)
/// * `language` - Translation language code, e.g. `en`
/// * `created_at` - When the upload was created on the remote side
/// * `groups` - Credited groups, in the order the remote lists them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterRecord {
    pub id: String,
    pub chapter: Option<String>,
    pub language: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl ChapterRecord {
    /// The group this upload is attributed to.
    ///
    /// Uploads may credit several groups; the first listed one is treated as
    /// the primary credit. Uploads without credits get [`Group::unknown`].
    pub fn primary_group(&self) -> Group {
        self.groups.first().cloned().unwrap_or_else(Group::unknown)
    }
}

/// Canonical numeric identity of a chapter.
///
/// Two keys are equal iff their numeric values are equal, so `"5"`, `"5.0"` and
/// `"05.00"` all produce the same key. Keys order numerically, never lexically.
/// The textual form is the shortest decimal rendering of the value.
///
/// ```rust
/// use shuroku::types::ChapterKey;
///
/// let mut keys: Vec<_> = ["10", "9.5", "2"]
///     .iter()
///     .filter_map(|raw| ChapterKey::parse(raw))
///     .collect();
/// keys.sort();
/// let rendered: Vec<String> = keys.iter().map(ToString::to_string).collect();
/// assert_eq!(rendered, ["2", "9.5", "10"]);
///
/// assert!(ChapterKey::parse("extra").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct ChapterKey {
    value: f64,
    text: String,
}

impl ChapterKey {
    /// Parses a raw chapter number. Returns `None` for empty, non-numeric or
    /// non-finite input.
    pub fn parse(raw: &str) -> Option<Self> {
        let value: f64 = raw.trim().parse().ok()?;
        Self::from_value(value)
    }

    /// Builds a key from a numeric value. Returns `None` for NaN or infinities.
    pub fn from_value(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        // collapse -0 onto 0
        let value = if value == 0.0 { 0.0 } else { value };
        Some(Self {
            value,
            text: value.to_string(),
        })
    }

    /// Numeric value of the chapter.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Canonical text of the key.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl PartialEq for ChapterKey {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for ChapterKey {}

impl Hash for ChapterKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl Ord for ChapterKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.total_cmp(&other.value)
    }
}

impl PartialOrd for ChapterKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ChapterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for ChapterKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| Error::parse(format!("Not a chapter number: '{}'", s)))
    }
}

/// One group's version of one chapter.
///
/// The group is always the record's primary (first listed) credit, see
/// [`ChapterRecord::primary_group`].
#[derive(Debug, Clone)]
pub struct CandidateEntry {
    pub key: ChapterKey,
    pub group: Group,
    pub record: ChapterRecord,
}

impl CandidateEntry {
    pub fn new(key: ChapterKey, record: ChapterRecord) -> Self {
        Self {
            key,
            group: record.primary_group(),
            record,
        }
    }
}

/// One page of catalog records, as returned by
/// [`CatalogSource::fetch_catalog_page`](crate::source::CatalogSource::fetch_catalog_page).
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    pub records: Vec<ChapterRecord>,
    pub has_more: bool,
}

/// Image quality served by the remote page servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Quality {
    /// Original uploads
    #[default]
    Data,
    /// Recompressed, smaller images
    DataSaver,
}

impl Quality {
    /// Path segment used by the page servers for this quality.
    pub fn path_segment(self) -> &'static str {
        match self {
            Quality::Data => "data",
            Quality::DataSaver => "data-saver",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

impl FromStr for Quality {
    type Err = Error;

    /// Accepts the path segment names as well as the menu style `1`/`2`.
    ///
    /// ```rust
    /// use shuroku::types::Quality;
    ///
    /// assert_eq!("high".parse::<Quality>().unwrap(), Quality::Data);
    /// assert_eq!("2".parse::<Quality>().unwrap(), Quality::DataSaver);
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "data" | "high" | "1" => Ok(Quality::Data),
            "data-saver" | "datasaver" | "saver" | "2" => Ok(Quality::DataSaver),
            other => Err(Error::parse(format!("Unknown quality '{}'", other))),
        }
    }
}

/// The ordered page list of one chapter upload.
#[derive(Debug, Clone)]
pub struct AssetManifest {
    pub base_url: String,
    pub hash: String,
    /// Page file names in reading order
    pub filenames: Vec<String>,
    pub quality: Quality,
}

impl AssetManifest {
    /// Full URL of one page file.
    ///
    /// ```rust
    /// use shuroku::types::{AssetManifest, Quality};
    ///
    /// let manifest = AssetManifest {
    ///     base_url: "https://node.example/".to_string(),
    ///     hash: "abc".to_string(),
    ///     filenames: vec!["1.png".to_string()],
    ///     quality: Quality::DataSaver,
    /// };
    /// assert_eq!(manifest.url_for("1.png"), "https://node.example/data-saver/abc/1.png");
    /// ```
    pub fn url_for(&self, filename: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.quality.path_segment(),
            self.hash,
            filename
        )
    }
}

/// One page to fetch inside a chapter attempt.
///
/// `index` is 1-based, unique within the attempt, and decides where the page
/// lands in the assembled document.
#[derive(Debug, Clone)]
pub struct AssetTask {
    pub index: usize,
    pub url: String,
    /// Scratch file the page bytes are written to
    pub slot: PathBuf,
}

/// Terminal result of acquiring one chapter.
#[derive(Debug, Clone, PartialEq)]
pub enum ChapterOutcome {
    /// A document was assembled from `group`'s upload.
    Success { group: Group, artifact: PathBuf },

    /// Every candidate was tried and failed, in the listed order.
    Exhausted { attempted: Vec<Group> },

    /// The chapter had no candidates in the ranked selection.
    NotFound,
}

impl ChapterOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ChapterOutcome::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapter_key_equivalent_spellings() {
        let spellings = ["5", "5.0", "05.00", " 5 "];
        let keys: Vec<ChapterKey> = spellings
            .iter()
            .map(|raw| ChapterKey::parse(raw).unwrap())
            .collect();
        for key in &keys {
            assert_eq!(key, &keys[0]);
            assert_eq!(key.as_str(), "5");
        }
    }

    #[test]
    fn test_chapter_key_rejects_garbage() {
        assert!(ChapterKey::parse("").is_none());
        assert!(ChapterKey::parse("Oneshot").is_none());
        assert!(ChapterKey::parse("NaN").is_none());
        assert!(ChapterKey::parse("inf").is_none());
    }

    #[test]
    fn test_chapter_key_numeric_order() {
        let nine = ChapterKey::parse("9").unwrap();
        let ten = ChapterKey::parse("10").unwrap();
        let half = ChapterKey::parse("9.5").unwrap();
        assert!(nine < half && half < ten);
        assert_eq!(ChapterKey::parse("-0").unwrap(), ChapterKey::parse("0").unwrap());
    }

    #[test]
    fn test_primary_group_falls_back_to_sentinel() {
        let record = ChapterRecord {
            id: "r".to_string(),
            chapter: Some("1".to_string()),
            language: "en".to_string(),
            created_at: Utc::now(),
            groups: vec![],
        };
        assert_eq!(record.primary_group(), Group::unknown());
    }

    #[test]
    fn test_quality_parse() {
        assert_eq!("data".parse::<Quality>().unwrap(), Quality::Data);
        assert_eq!("dataSaver".parse::<Quality>().unwrap(), Quality::DataSaver);
        assert!("ultra".parse::<Quality>().is_err());
    }
}
