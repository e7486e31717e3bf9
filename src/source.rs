//! Collaborator traits for catalog sources and page fetching.
//!
//! The ranking and acquisition core never talks HTTP directly. It consumes:
//!
//! - a [`CatalogSource`], which lists chapter uploads of a work page by page,
//!   resolves the page manifest of one upload and looks up the work's title;
//! - an [`AssetFetcher`], which turns one page URL into bytes.
//!
//! [`MangaDexSource`](crate::sources::MangaDexSource) and
//! [`HttpClient`](crate::net::HttpClient) are the shipped implementations; tests
//! plug in in-memory fakes.
//!
//! # Examples
//!
//! ```rust,no_run
//! use shuroku::source::fetch_catalog;
//! use shuroku::sources::MangaDexSource;
//!
//! # async fn example() -> shuroku::Result<()> {
//! let source = MangaDexSource::new();
//! let records = fetch_catalog(&source, "a96676e5-8ae2-425e-b549-7f15dd34a6d8").await?;
//! println!("{} uploads", records.len());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    error::{Error, Result},
    types::{AssetManifest, CatalogPage, ChapterRecord, Quality},
};

/// Number of records requested per catalog page.
pub const CATALOG_PAGE_SIZE: usize = 100;

/// A remote catalog of chapter uploads.
///
/// # Implementation Guidelines
///
/// - Report `has_more = false` on the last page; [`fetch_catalog`] stops there
/// - Return [`Error::ManifestResolution`] (or any other recoverable error) when
///   an upload's pages cannot be listed; the pipeline falls back on it
/// - Apply rate limiting to respect the remote's policies
///
/// ```rust
/// use async_trait::async_trait;
/// use shuroku::source::CatalogSource;
/// use shuroku::types::{AssetManifest, CatalogPage, Quality};
/// use shuroku::Result;
///
/// struct Empty;
///
/// #[async_trait]
/// impl CatalogSource for Empty {
///     fn id(&self) -> &'static str { "empty" }
///
///     async fn fetch_catalog_page(&self, _work: &str, _offset: usize, _limit: usize) -> Result<CatalogPage> {
///         Ok(CatalogPage::default())
///     }
///
///     async fn resolve_manifest(&self, chapter_id: &str, _quality: Quality) -> Result<AssetManifest> {
///         Err(shuroku::Error::manifest(chapter_id, "no pages"))
///     }
///
///     async fn fetch_title(&self, work_id: &str) -> Result<String> {
///         Ok(work_id.to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Short identifier used in logs and errors.
    fn id(&self) -> &'static str;

    /// Fetches one page of the work's catalog, starting at `offset`.
    async fn fetch_catalog_page(
        &self,
        work_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<CatalogPage>;

    /// Resolves the ordered page list of one upload at the given quality.
    async fn resolve_manifest(&self, chapter_id: &str, quality: Quality) -> Result<AssetManifest>;

    /// Looks up the display title of the work.
    async fn fetch_title(&self, work_id: &str) -> Result<String>;
}

/// Fetches the bytes behind one page URL.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// Pulls the whole catalog of a work, page after page, until the source
/// reports no more records.
///
/// # Errors
///
/// Any failure is returned as [`Error::CatalogFetch`]: there is no fallback for
/// a missing catalog, so the run ends here.
pub async fn fetch_catalog<S>(source: &S, work_id: &str) -> Result<Vec<ChapterRecord>>
where
    S: CatalogSource + ?Sized,
{
    let mut records = Vec::new();
    let mut offset = 0;

    loop {
        let page = source
            .fetch_catalog_page(work_id, offset, CATALOG_PAGE_SIZE)
            .await
            .map_err(|e| match e {
                e @ Error::CatalogFetch { .. } => e,
                other => Error::catalog_fetch(work_id, other),
            })?;

        let received = page.records.len();
        records.extend(page.records);
        tracing::debug!(source = source.id(), offset, received, "catalog page");

        if !page.has_more || received == 0 {
            break;
        }
        offset += received;
    }

    tracing::info!(source = source.id(), work_id, uploads = records.len(), "fetched catalog");
    Ok(records)
}
