//! # Shuroku - group-aware manga chapter downloader
//!
//! Shuroku turns a remote manga catalog into one document per chapter. Popular
//! chapters are often translated by several scanlation groups; shuroku ranks
//! those groups over the chapters you asked for, downloads each chapter from
//! the most consistent group, and silently falls back to the next group when a
//! release is broken or its image servers are unreachable.
//!
//! ## Features
//!
//! - **Group Ranking**: Prefers groups that cover most of the requested range,
//!   keeping consecutive chapters from the same translation
//! - **Automatic Fallback**: A failed manifest, page or assembly moves on to the
//!   next group; one chapter failing never stops the others
//! - **Bounded Concurrency**: Pages of a chapter are fetched in parallel with a
//!   fixed limit and always assembled in manifest order
//! - **Clean Scratch Space**: Partial downloads live in attempt-scoped temporary
//!   directories that are removed on every exit path
//! - **Pluggable Collaborators**: Catalog, page fetching and document assembly
//!   are traits; MangaDex, HTTP and CBZ implementations are included
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use shuroku::prelude::*;
//! use shuroku::net::HttpClient;
//! # #[cfg(feature = "source-mangadex")]
//! use shuroku::sources::MangaDexSource;
//!
//! # #[cfg(feature = "source-mangadex")]
//! #[tokio::main]
//! async fn main() -> shuroku::Result<()> {
//!     let source = Arc::new(MangaDexSource::new());
//!     let work_id = MangaDexSource::parse_work_id("https://mangadex.org/title/a96676e5-8ae2-425e-b549-7f15dd34a6d8")?;
//!
//!     // Catalog errors are fatal, everything after this point falls back
//!     let records = fetch_catalog(source.as_ref(), &work_id).await?;
//!     let catalog = normalize(&records, "en");
//!     let keys = catalog.select(&ChapterRange::parse("1", "10")?)?;
//!
//!     let acquisition = Acquisition::builder()
//!         .source(source)
//!         .fetcher(Arc::new(HttpClient::new("at-home").with_rate_limit(0)))
//!         .output_dir("downloads/komi")
//!         .build()
//!         .map_err(|e| shuroku::Error::Other(e.to_string()))?;
//!
//!     let report = acquisition
//!         .run(&catalog, &keys, Quality::Data, &|event: &ProgressEvent| println!("{event}"))
//!         .await;
//!     println!("{report}");
//!     Ok(())
//! }
//! # #[cfg(not(feature = "source-mangadex"))]
//! # fn main() {}
//! ```
//!
//! ## Architecture
//!
//! - [`catalog`]: Language filtering, chapter keys and range selection
//! - [`ranking`]: Global group order and per-chapter candidate order
//! - [`pool`]: Bounded-concurrency page fetching
//! - [`pipeline`]: Per-chapter attempts with group fallback
//! - [`source`]: Collaborator traits and catalog pagination
//! - [`assemble`]: Page → document assembly
//! - [`net`]: HTTP client with pacing and retries
//! - [`error`]: Error taxonomy

pub mod assemble;
pub mod catalog;
pub mod download;
pub mod error;
pub mod net;
pub mod pipeline;
pub mod pool;
pub mod ranking;
pub mod source;
pub mod sources;
pub mod types;

#[cfg(feature = "cli")]
pub mod logging;

/// Prelude module for convenient imports.
///
/// ```rust
/// use shuroku::prelude::*;
///
/// // Now you have access to:
/// // - normalize, ChapterRange, Catalog
/// // - rank, GroupPreference
/// // - Acquisition, ProgressEvent, ProgressSink
/// // - fetch_catalog, CatalogSource, AssetFetcher
/// // - ChapterKey, ChapterOutcome, Quality, ...
/// ```
pub mod prelude {
    pub use crate::{
        assemble::{Assembler, CbzAssembler},
        catalog::{Catalog, ChapterRange, available_languages, normalize},
        download::sanitize_filename,
        pipeline::{
            Acquisition, AcquisitionBuilder, AcquisitionReport, NoProgress, ProgressEvent,
            ProgressSink,
        },
        ranking::{GroupPreference, rank},
        source::{AssetFetcher, CatalogSource, fetch_catalog},
        types::{
            CandidateEntry, ChapterKey, ChapterOutcome, ChapterRecord, Group, Quality,
        },
    };
}

// Re-export main types at crate root for direct access
pub use catalog::{Catalog, ChapterRange, normalize};
pub use error::{Error, Result};
pub use pipeline::{Acquisition, AcquisitionReport, ProgressEvent, ProgressSink};
pub use ranking::{GroupPreference, rank};
pub use source::{AssetFetcher, CatalogSource, fetch_catalog};
pub use types::{ChapterKey, ChapterOutcome, Quality};
