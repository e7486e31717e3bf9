//! Catalog normalization and chapter range selection.
//!
//! The remote catalog lists chapter *uploads*: the same chapter shows up once
//! per group that translated it, in every language. [`normalize`] keeps the
//! uploads of one language and buckets them by [`ChapterKey`], producing a
//! [`Catalog`] that the ranking engine consumes.
//!
//! # Examples
//!
//! ```rust
//! use shuroku::catalog::{normalize, ChapterRange};
//! # use shuroku::types::ChapterRecord;
//! # fn records() -> Vec<ChapterRecord> { Vec::new() }
//!
//! # fn example() -> shuroku::Result<()> {
//! let catalog = normalize(&records(), "en");
//! let range = ChapterRange::parse("1", "10")?;
//! let keys = catalog.select(&range)?;
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{Error, Result};
use crate::types::{CandidateEntry, ChapterKey, ChapterRecord};

/// Chapter uploads of one language, bucketed by chapter.
///
/// Iteration follows ascending numeric chapter order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<ChapterKey, Vec<CandidateEntry>>,
}

impl Catalog {
    /// Candidate uploads of one chapter, in catalog order.
    pub fn get(&self, key: &ChapterKey) -> Option<&[CandidateEntry]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: &ChapterKey) -> bool {
        self.entries.contains_key(key)
    }

    /// All chapter keys, ascending.
    pub fn keys(&self) -> impl Iterator<Item = &ChapterKey> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Chapters falling inside `range` (bounds included), ascending.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRange`] if no chapter of the catalog falls in the range.
    pub fn select(&self, range: &ChapterRange) -> Result<Vec<ChapterKey>> {
        // BTreeMap::range panics on inverted bounds
        if range.start > range.end {
            return Err(Error::invalid_range(format!(
                "start {} is after end {}",
                range.start, range.end
            )));
        }
        let keys: Vec<ChapterKey> = self
            .entries
            .range(range.start.clone()..=range.end.clone())
            .map(|(k, _)| k.clone())
            .collect();

        if keys.is_empty() {
            return Err(Error::invalid_range(format!(
                "no chapters between {} and {}",
                range.start, range.end
            )));
        }
        Ok(keys)
    }
}

/// Buckets `records` of the requested `language` by chapter.
///
/// Records in other languages are dropped. Records whose chapter number is
/// missing or not numeric are dropped too: they cannot be placed in a numeric
/// range, so they are simply unreachable by selection. Every surviving record
/// becomes exactly one [`CandidateEntry`] attributed to its primary group.
pub fn normalize(records: &[ChapterRecord], language: &str) -> Catalog {
    let mut entries: BTreeMap<ChapterKey, Vec<CandidateEntry>> = BTreeMap::new();
    let mut skipped = 0usize;

    for record in records.iter().filter(|r| r.language == language) {
        let Some(key) = record.chapter.as_deref().and_then(ChapterKey::parse) else {
            skipped += 1;
            continue;
        };
        entries
            .entry(key.clone())
            .or_default()
            .push(CandidateEntry::new(key, record.clone()));
    }

    if skipped > 0 {
        tracing::debug!(skipped, language, "dropped uploads without a numeric chapter");
    }

    Catalog { entries }
}

/// Distinct language codes present in the catalog, sorted.
pub fn available_languages(records: &[ChapterRecord]) -> BTreeSet<String> {
    records.iter().map(|r| r.language.clone()).collect()
}

/// An inclusive chapter range picked by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRange {
    pub start: ChapterKey,
    pub end: ChapterKey,
}

impl ChapterRange {
    /// Parses the start and end chapter numbers.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRange`] if either bound is not a chapter number or the
    /// start comes after the end.
    ///
    /// ```rust
    /// use shuroku::catalog::ChapterRange;
    ///
    /// assert!(ChapterRange::parse("1", "5.5").is_ok());
    /// assert!(ChapterRange::parse("6", "5").is_err());
    /// assert!(ChapterRange::parse("", "5").is_err());
    /// ```
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let bound = |raw: &str, which: &str| {
            ChapterKey::parse(raw).ok_or_else(|| {
                Error::invalid_range(format!("{} chapter '{}' is not a number", which, raw))
            })
        };
        let start = bound(start, "start")?;
        let end = bound(end, "end")?;

        if start > end {
            return Err(Error::invalid_range(format!(
                "start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }
}

impl fmt::Display for ChapterRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
