//! Common test utilities
//!
//! Offline stand-ins for the remote catalog and the page servers, shared by
//! the pipeline and pool tests.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use shuroku::error::{Error, Result};
use shuroku::source::{AssetFetcher, CatalogSource};
use shuroku::types::{AssetManifest, CatalogPage, ChapterRecord, Group, Quality};

/// Every fake page starts with a PNG signature so the CBZ assembler accepts it
#[allow(dead_code)]
pub const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

#[allow(dead_code)]
pub const PAGE_HOST: &str = "https://pages.test";

/// A single-group English upload; `day` orders uploads in time.
#[allow(dead_code)]
pub fn record(id: &str, chapter: &str, group: &str, day: i64) -> ChapterRecord {
    ChapterRecord {
        id: id.to_string(),
        chapter: Some(chapter.to_string()),
        language: "en".to_string(),
        created_at: Utc
            .timestamp_opt(1_600_000_000 + day * 86_400, 0)
            .single()
            .unwrap(),
        groups: vec![group_named(group)],
    }
}

#[allow(dead_code)]
pub fn group_named(name: &str) -> Group {
    Group::new(format!("g-{}", name.to_lowercase()), name)
}

/// Body served for `url`: PNG magic followed by the URL itself, so the page a
/// document entry came from can be read back.
#[allow(dead_code)]
pub fn page_body(url: &str) -> Bytes {
    let mut body = PNG_MAGIC.to_vec();
    body.extend_from_slice(url.as_bytes());
    Bytes::from(body)
}

/// Catalog source whose manifests are configured per upload id.
#[derive(Default)]
#[allow(dead_code)]
pub struct FakeSource {
    pages: HashMap<String, usize>,
    broken: HashSet<String>,
    resolved: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload `id` resolves to `pages` pages named `p1.png`, `p2.png`, ...
    pub fn with_chapter(mut self, id: &str, pages: usize) -> Self {
        self.pages.insert(id.to_string(), pages);
        self
    }

    /// Manifest resolution for upload `id` fails
    pub fn with_broken(mut self, id: &str) -> Self {
        self.broken.insert(id.to_string());
        self
    }

    /// Upload ids in the order their manifests were requested
    pub fn resolved(&self) -> Vec<String> {
        self.resolved.lock().clone()
    }
}

#[async_trait]
impl CatalogSource for FakeSource {
    fn id(&self) -> &'static str {
        "fake"
    }

    async fn fetch_catalog_page(
        &self,
        _work_id: &str,
        _offset: usize,
        _limit: usize,
    ) -> Result<CatalogPage> {
        Ok(CatalogPage::default())
    }

    async fn resolve_manifest(&self, chapter_id: &str, quality: Quality) -> Result<AssetManifest> {
        self.resolved.lock().push(chapter_id.to_string());

        if self.broken.contains(chapter_id) {
            return Err(Error::source("fake", "HTTP 500 for /at-home/server"));
        }
        let count = self
            .pages
            .get(chapter_id)
            .copied()
            .ok_or_else(|| Error::not_found(format!("upload {}", chapter_id)))?;

        Ok(AssetManifest {
            base_url: PAGE_HOST.to_string(),
            hash: chapter_id.to_string(),
            filenames: (1..=count).map(|i| format!("p{}.png", i)).collect(),
            quality,
        })
    }

    async fn fetch_title(&self, work_id: &str) -> Result<String> {
        Ok(work_id.to_string())
    }
}

/// Page fetcher with per-URL failures and delays that tracks how many
/// requests run at once.
#[derive(Default)]
#[allow(dead_code)]
pub struct FakeFetcher {
    failing: Vec<String>,
    delays: Vec<(String, Duration)>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    requests: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs containing `fragment` answer with an error
    pub fn failing_on(mut self, fragment: &str) -> Self {
        self.failing.push(fragment.to_string());
        self
    }

    /// URLs containing `fragment` take `delay` to answer
    pub fn delaying(mut self, fragment: &str, delay: Duration) -> Self {
        self.delays.push((fragment.to_string(), delay));
        self
    }

    /// Highest number of requests observed in flight together
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl AssetFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let delay = self
            .delays
            .iter()
            .find(|(fragment, _)| url.contains(fragment.as_str()))
            .map(|(_, delay)| *delay)
            .unwrap_or(Duration::from_millis(2));
        tokio::time::sleep(delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.requests.lock().push(url.to_string());

        if self.failing.iter().any(|fragment| url.contains(fragment.as_str())) {
            return Err(Error::source("fake", format!("HTTP 404 for {}", url)));
        }
        Ok(page_body(url))
    }
}

/// File names directly inside `dir`, sorted
#[allow(dead_code)]
pub fn entries(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|read| {
            read.filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
