//! Scanlation group ranking.
//!
//! Groups that translated more of the requested chapters are more likely to
//! have complete, consistent releases. Preferring them keeps consecutive
//! chapters from hopping between groups with different naming and quality.
//!
//! [`rank`] is a pure function: it tallies occurrences over the selected
//! chapters only and returns an immutable [`GroupPreference`] that is computed
//! once per run and reused for every chapter.
//!
//! # Algorithm
//!
//! 1. Keep the selected chapter keys; keys missing from the catalog add nothing.
//! 2. Count, per group, how many selected uploads credit it as primary group.
//! 3. Global order: descending count, then ascending display name, then id.
//! 4. Per chapter: candidates by position of their group in the global order,
//!    then most recent upload first.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use crate::catalog::Catalog;
use crate::types::{CandidateEntry, ChapterKey, Group};

/// A group's place in the global order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupStanding {
    pub group: Group,
    /// Uploads crediting this group within the ranked chapters
    pub occurrences: usize,
}

/// Ranking result for one chapter selection.
#[derive(Debug, Clone, Default)]
pub struct GroupPreference {
    global_order: Vec<GroupStanding>,
    candidates: BTreeMap<ChapterKey, Vec<CandidateEntry>>,
}

impl GroupPreference {
    /// Groups from most to least preferred.
    pub fn global_order(&self) -> &[GroupStanding] {
        &self.global_order
    }

    /// Groups from most to least preferred, without counts.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.global_order.iter().map(|s| &s.group)
    }

    /// Ordered candidates of one chapter, most preferred first.
    ///
    /// Empty when the chapter was not part of the ranked selection.
    pub fn candidates(&self, key: &ChapterKey) -> &[CandidateEntry] {
        self.candidates.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Ranked chapter keys, ascending.
    pub fn keys(&self) -> impl Iterator<Item = &ChapterKey> {
        self.candidates.keys()
    }
}

/// Ranks the groups of `catalog` over the chapters in `subset`.
///
/// ```rust
/// use shuroku::catalog::normalize;
/// use shuroku::ranking::rank;
///
/// let catalog = normalize(&[], "en");
/// let preference = rank(&catalog, &[]);
/// assert!(preference.global_order().is_empty());
/// ```
pub fn rank(catalog: &Catalog, subset: &[ChapterKey]) -> GroupPreference {
    let mut selected: Vec<&ChapterKey> = subset.iter().filter(|k| catalog.contains(k)).collect();
    selected.sort();
    selected.dedup();

    let mut counts: HashMap<&Group, usize> = HashMap::new();
    for key in &selected {
        for entry in catalog.get(key).unwrap_or_default() {
            *counts.entry(&entry.group).or_default() += 1;
        }
    }

    let mut global_order: Vec<GroupStanding> = counts
        .into_iter()
        .map(|(group, occurrences)| GroupStanding {
            group: group.clone(),
            occurrences,
        })
        .collect();
    global_order.sort_by(|a, b| {
        b.occurrences
            .cmp(&a.occurrences)
            .then_with(|| a.group.name.cmp(&b.group.name))
            .then_with(|| a.group.id.cmp(&b.group.id))
    });

    let positions: HashMap<&Group, usize> = global_order
        .iter()
        .enumerate()
        .map(|(i, s)| (&s.group, i))
        .collect();

    let candidates = selected
        .into_iter()
        .map(|key| {
            let mut entries = catalog.get(key).unwrap_or_default().to_vec();
            entries.sort_by_key(|e| {
                (
                    positions.get(&e.group).copied().unwrap_or(usize::MAX),
                    Reverse(e.record.created_at),
                )
            });
            (key.clone(), entries)
        })
        .collect();

    GroupPreference {
        global_order,
        candidates,
    }
}
