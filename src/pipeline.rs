//! Chapter acquisition with automatic group fallback.
//!
//! For each selected chapter the pipeline walks the ranked candidates:
//!
//! ```text
//! Pending -> Attempting(1) -> Success
//!                          -> Attempting(2) -> ... -> Exhausted
//! ```
//!
//! One attempt resolves the candidate's page manifest, downloads every page
//! through the fetch pool into an attempt-scoped scratch directory, assembles
//! the pages in manifest order and writes the document. Any failure along the
//! way discards the attempt (the scratch directory is removed on every exit
//! path) and moves on to the next candidate. Chapters are processed one at a
//! time in ascending order, and a chapter that runs out of candidates never
//! stops the ones after it.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use shuroku::prelude::*;
//! use shuroku::net::HttpClient;
//! use shuroku::sources::MangaDexSource;
//!
//! # async fn example() -> shuroku::Result<()> {
//! let source = Arc::new(MangaDexSource::new());
//! let records = fetch_catalog(source.as_ref(), "a96676e5-8ae2-425e-b549-7f15dd34a6d8").await?;
//! let catalog = normalize(&records, "en");
//! let keys = catalog.select(&ChapterRange::parse("1", "5")?)?;
//!
//! let acquisition = Acquisition::builder()
//!     .source(source)
//!     .fetcher(Arc::new(HttpClient::new("at-home").with_rate_limit(0)))
//!     .output_dir("downloads/example")
//!     .build()
//!     .map_err(|e| shuroku::Error::Other(e.to_string()))?;
//!
//! let report = acquisition
//!     .run(&catalog, &keys, Quality::Data, &|event: &ProgressEvent| println!("{event}"))
//!     .await;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

use bytes::Bytes;
use derive_builder::Builder;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    assemble::{Assembler, CbzAssembler},
    catalog::Catalog,
    download::artifact_path,
    error::{Error, Result},
    pool::{PAGE_CONCURRENCY, fetch_all, plan_tasks},
    ranking::rank,
    source::{AssetFetcher, CatalogSource},
    types::{CandidateEntry, ChapterKey, ChapterOutcome, Group, Quality},
};

/// Status events emitted while acquiring chapters.
///
/// Events are informational only; sinks cannot influence the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Groups of the run, most preferred first.
    Ranked { groups: Vec<Group> },
    AttemptStarted { key: ChapterKey, group: Group },
    AttemptSucceeded { key: ChapterKey, group: Group, artifact: PathBuf },
    AttemptFailed { key: ChapterKey, group: Group, reason: String },
    /// Every candidate of the chapter failed.
    Exhausted { key: ChapterKey, attempted: Vec<Group> },
    /// The chapter had no candidates at all.
    NotFound { key: ChapterKey },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::Ranked { groups } => {
                write!(f, "Detected scanlation groups (in order of preference):")?;
                for (i, group) in groups.iter().take(5).enumerate() {
                    write!(f, "\n{}. {}", i + 1, group)?;
                }
                if groups.len() > 5 {
                    write!(f, "\n... and {} more", groups.len() - 5)?;
                }
                Ok(())
            }
            ProgressEvent::AttemptStarted { key, group } => {
                write!(f, "Attempting Chapter {} ({})...", key, group)
            }
            ProgressEvent::AttemptSucceeded {
                key,
                group,
                artifact,
            } => write!(
                f,
                "Successfully downloaded Chapter {} ({}) to {}",
                key,
                group,
                artifact.display()
            ),
            ProgressEvent::AttemptFailed { key, group, reason } => {
                write!(f, "Chapter {} failed with {}: {}", key, group, reason)
            }
            ProgressEvent::Exhausted { key, attempted } => write!(
                f,
                "All groups failed for Chapter {} (tried {})",
                key,
                join_names(attempted)
            ),
            ProgressEvent::NotFound { key } => {
                write!(f, "Chapter {} not found in any group", key)
            }
        }
    }
}

/// Receiver of [`ProgressEvent`]s.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: &ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&self, _event: &ProgressEvent) {}
}

fn report(progress: &dyn ProgressSink, event: ProgressEvent) {
    match &event {
        ProgressEvent::Ranked { groups } => {
            tracing::info!(groups = groups.len(), "ranked scanlation groups")
        }
        ProgressEvent::AttemptStarted { key, group } => {
            tracing::info!(chapter = %key, group = %group, "attempting chapter")
        }
        ProgressEvent::AttemptSucceeded { key, group, artifact } => tracing::info!(
            chapter = %key,
            group = %group,
            artifact = %artifact.display(),
            "chapter assembled"
        ),
        ProgressEvent::AttemptFailed { key, group, reason } => {
            tracing::warn!(chapter = %key, group = %group, %reason, "attempt failed")
        }
        ProgressEvent::Exhausted { key, attempted } => {
            tracing::error!(chapter = %key, tried = attempted.len(), "all groups failed")
        }
        ProgressEvent::NotFound { key } => tracing::warn!(chapter = %key, "chapter not found"),
    }
    progress.emit(&event);
}

fn join_names(groups: &[Group]) -> String {
    groups
        .iter()
        .map(|g| g.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn default_assembler() -> Arc<dyn Assembler> {
    Arc::new(CbzAssembler::default())
}

/// Downloads chapters, falling back across scanlation groups.
///
/// Built with [`Acquisition::builder`]: `source`, `fetcher` and `output_dir`
/// are required, the assembler defaults to [`CbzAssembler`].
#[derive(Builder)]
#[builder(pattern = "owned")]
pub struct Acquisition {
    /// Resolves page manifests
    source: Arc<dyn CatalogSource>,

    /// Downloads page bytes
    fetcher: Arc<dyn AssetFetcher>,

    #[builder(default = "default_assembler()")]
    assembler: Arc<dyn Assembler>,

    /// Directory receiving the chapter documents
    #[builder(setter(into))]
    output_dir: PathBuf,
}

impl Acquisition {
    pub fn builder() -> AcquisitionBuilder {
        AcquisitionBuilder::default()
    }

    pub fn output_dir(&self) -> &std::path::Path {
        &self.output_dir
    }

    /// Acquires every chapter in `keys`.
    ///
    /// Keys are deduplicated and processed in ascending order. Groups are
    /// ranked once, over the keys present in `catalog`; keys absent from it end
    /// as [`ChapterOutcome::NotFound`].
    pub async fn run(
        &self,
        catalog: &Catalog,
        keys: &[ChapterKey],
        quality: Quality,
        progress: &dyn ProgressSink,
    ) -> AcquisitionReport {
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();

        let preference = rank(catalog, &keys);
        report(
            progress,
            ProgressEvent::Ranked {
                groups: preference.groups().cloned().collect(),
            },
        );

        let mut outcomes = BTreeMap::new();
        for key in keys {
            let outcome = self
                .acquire(&key, preference.candidates(&key), quality, progress)
                .await;
            outcomes.insert(key, outcome);
        }

        AcquisitionReport { outcomes }
    }

    /// Tries `candidates` in order until one yields a document.
    ///
    /// Never fails: per-candidate errors become fallback decisions and the
    /// chapter ends in exactly one [`ChapterOutcome`].
    pub async fn acquire(
        &self,
        key: &ChapterKey,
        candidates: &[CandidateEntry],
        quality: Quality,
        progress: &dyn ProgressSink,
    ) -> ChapterOutcome {
        if candidates.is_empty() {
            report(progress, ProgressEvent::NotFound { key: key.clone() });
            return ChapterOutcome::NotFound;
        }

        let mut attempted = Vec::with_capacity(candidates.len());
        for entry in candidates {
            let group = entry.group.clone();
            report(
                progress,
                ProgressEvent::AttemptStarted {
                    key: key.clone(),
                    group: group.clone(),
                },
            );
            attempted.push(group.clone());

            match self.attempt(key, entry, quality).await {
                Ok(artifact) => {
                    report(
                        progress,
                        ProgressEvent::AttemptSucceeded {
                            key: key.clone(),
                            group: group.clone(),
                            artifact: artifact.clone(),
                        },
                    );
                    return ChapterOutcome::Success { group, artifact };
                }
                Err(error) => report(
                    progress,
                    ProgressEvent::AttemptFailed {
                        key: key.clone(),
                        group,
                        reason: error.to_string(),
                    },
                ),
            }
        }

        report(
            progress,
            ProgressEvent::Exhausted {
                key: key.clone(),
                attempted: attempted.clone(),
            },
        );
        ChapterOutcome::Exhausted { attempted }
    }

    /// One full try against a single candidate.
    async fn attempt(
        &self,
        key: &ChapterKey,
        entry: &CandidateEntry,
        quality: Quality,
    ) -> Result<PathBuf> {
        let chapter_id = entry.record.id.as_str();
        let manifest = self
            .source
            .resolve_manifest(chapter_id, quality)
            .await
            .map_err(|e| match e {
                e @ Error::ManifestResolution { .. } => e,
                other => Error::manifest(chapter_id, other),
            })?;
        if manifest.filenames.is_empty() {
            return Err(Error::manifest(chapter_id, "manifest lists no pages"));
        }

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let prefix = format!(".chapter-{}-", key);
        let scratch = tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir_in(&self.output_dir)?;

        let tasks = plan_tasks(&manifest, scratch.path());
        tracing::debug!(chapter = %key, pages = tasks.len(), "fetching pages");
        let pages = fetch_all(self.fetcher.as_ref(), &tasks, PAGE_CONCURRENCY)
            .await
            .into_iter()
            .collect::<Result<Vec<Bytes>>>()?;

        let assembler = Arc::clone(&self.assembler);
        let document = tokio::task::spawn_blocking(move || assembler.assemble(&pages)).await??;

        // Staged inside the scratch directory so a failed write leaves nothing behind
        let extension = self.assembler.extension();
        let staged = scratch.path().join(format!("document.{}", extension));
        tokio::fs::write(&staged, document).await?;

        let artifact = artifact_path(&self.output_dir, key, extension);
        tokio::fs::rename(&staged, &artifact).await?;
        Ok(artifact)
    }
}

/// Outcomes of one run, keyed by chapter in ascending order.
#[derive(Debug, Clone, Default)]
pub struct AcquisitionReport {
    pub outcomes: BTreeMap<ChapterKey, ChapterOutcome>,
}

impl AcquisitionReport {
    pub fn get(&self, key: &ChapterKey) -> Option<&ChapterOutcome> {
        self.outcomes.get(key)
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_success()).count()
    }

    /// Chapters that did not produce a document, ascending.
    pub fn failed(&self) -> Vec<&ChapterKey> {
        self.outcomes
            .iter()
            .filter(|(_, o)| !o.is_success())
            .map(|(k, _)| k)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.outcomes.values().all(ChapterOutcome::is_success)
    }
}

impl fmt::Display for AcquisitionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} chapters downloaded",
            self.succeeded(),
            self.outcomes.len()
        )?;
        for (key, outcome) in &self.outcomes {
            match outcome {
                ChapterOutcome::Success { .. } => {}
                ChapterOutcome::Exhausted { attempted } => write!(
                    f,
                    "\n  Chapter {}: all groups failed ({})",
                    key,
                    join_names(attempted)
                )?,
                ChapterOutcome::NotFound => write!(f, "\n  Chapter {}: not found", key)?,
            }
        }
        Ok(())
    }
}
