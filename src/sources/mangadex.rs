use crate::{
    error::{Error, Result},
    net::HttpClient,
    source::CatalogSource,
    types::{AssetManifest, CatalogPage, ChapterRecord, Group, Quality},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

/// MangaDex manga response
#[derive(Debug, Deserialize)]
struct MangaDexMangaResponse {
    data: MangaDexMangaData,
}

/// MangaDex manga data structure
#[derive(Debug, Deserialize)]
struct MangaDexMangaData {
    attributes: MangaDexMangaAttributes,
}

/// MangaDex manga attributes
#[derive(Debug, Deserialize)]
struct MangaDexMangaAttributes {
    #[serde(default)]
    title: HashMap<String, String>,
}

/// MangaDex chapter feed response
#[derive(Debug, Deserialize)]
struct MangaDexFeedResponse {
    data: Vec<MangaDexChapterData>,
    total: usize,
}

/// MangaDex chapter data structure
#[derive(Debug, Deserialize)]
struct MangaDexChapterData {
    id: String,
    attributes: MangaDexChapterAttributes,
    #[serde(default)]
    relationships: Vec<MangaDexRelationship>,
}

/// MangaDex chapter attributes
#[derive(Debug, Deserialize)]
struct MangaDexChapterAttributes {
    chapter: Option<String>,
    #[serde(rename = "translatedLanguage")]
    translated_language: String,
    #[serde(rename = "createdAt")]
    created_at: DateTime<Utc>,
}

/// MangaDex relationship structure
#[derive(Debug, Deserialize)]
struct MangaDexRelationship {
    id: String,
    #[serde(rename = "type")]
    rel_type: String,
    attributes: Option<MangaDexRelationshipAttributes>,
}

/// MangaDex relationship attributes
#[derive(Debug, Deserialize)]
struct MangaDexRelationshipAttributes {
    name: Option<String>,
}

/// MangaDex at-home server response
#[derive(Debug, Deserialize)]
struct MangaDexAtHomeResponse {
    #[serde(rename = "baseUrl")]
    base_url: String,
    chapter: MangaDexChapterPages,
}

/// MangaDex chapter pages structure
#[derive(Debug, Deserialize)]
struct MangaDexChapterPages {
    hash: String,
    #[serde(default)]
    data: Vec<String>,
    #[serde(rename = "dataSaver", default)]
    data_saver: Vec<String>,
}

/// MangaDex catalog source.
///
/// Lists every upload of a title in all languages with its scanlation group
/// credits, and resolves page manifests through the at-home server API.
///
/// # Rate Limiting
///
/// The API allows about 5 requests per second; this source sends at most one
/// per second and retries throttled requests. Page downloads go to the at-home
/// nodes and are not paced by this client.
///
/// # Examples
///
/// ```rust,no_run
/// use shuroku::sources::MangaDexSource;
/// use shuroku::source::{CatalogSource, fetch_catalog};
///
/// # async fn example() -> shuroku::Result<()> {
/// let source = MangaDexSource::new();
/// let work_id = MangaDexSource::parse_work_id(
///     "https://mangadex.org/title/a96676e5-8ae2-425e-b549-7f15dd34a6d8/komi-san",
/// )?;
/// let title = source.fetch_title(&work_id).await?;
/// let records = fetch_catalog(&source, &work_id).await?;
/// # Ok(())
/// # }
/// ```
pub struct MangaDexSource {
    client: HttpClient,
    api_base: String,
}

impl MangaDexSource {
    /// Create a new MangaDex source
    pub fn new() -> Self {
        Self::with_api_base("https://api.mangadex.org")
    }

    /// Create a source talking to another API host (mirrors, local stubs)
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            client: HttpClient::new("mangadex")
                .with_rate_limit(1000)
                .with_max_retries(3),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Extracts the title id from a `https://mangadex.org/title/{id}/...` URL.
    ///
    /// ```rust
    /// use shuroku::sources::MangaDexSource;
    ///
    /// let id = MangaDexSource::parse_work_id("https://mangadex.org/title/abc-123/some-name").unwrap();
    /// assert_eq!(id, "abc-123");
    /// assert!(MangaDexSource::parse_work_id("https://mangadex.org/chapter/abc").is_err());
    /// ```
    pub fn parse_work_id(url: &str) -> Result<String> {
        let parsed = url::Url::parse(url.trim())
            .map_err(|e| Error::parse(format!("Invalid MangaDex URL '{}': {}", url, e)))?;

        let mut segments = parsed.path_segments().into_iter().flatten();
        match (segments.next(), segments.next()) {
            (Some("title"), Some(id)) if !id.is_empty() => Ok(id.to_string()),
            _ => Err(Error::parse(format!(
                "Invalid MangaDex URL '{}': expected /title/<id>",
                url
            ))),
        }
    }

    /// Pick the English title, else any non-empty one
    fn extract_best_title(title_map: &HashMap<String, String>) -> String {
        title_map
            .get("en")
            .filter(|t| !t.trim().is_empty())
            .or_else(|| title_map.values().find(|t| !t.trim().is_empty()))
            .map(|t| t.trim().to_string())
            .unwrap_or_else(|| "Unknown Title".to_string())
    }

    /// Format feed query parameters
    fn format_feed_query(offset: usize, limit: usize) -> String {
        let params = [
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
            ("includes[]", "scanlation_group".to_string()),
            ("order[chapter]", "asc".to_string()),
            ("contentRating[]", "safe".to_string()),
            ("contentRating[]", "suggestive".to_string()),
            ("contentRating[]", "erotica".to_string()),
            ("contentRating[]", "pornographic".to_string()),
        ];

        params
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(key),
                    urlencoding::encode(value)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Map a feed entry to a catalog record, keeping group credits in order
    fn map_chapter(data: MangaDexChapterData) -> ChapterRecord {
        let groups = data
            .relationships
            .into_iter()
            .filter(|rel| rel.rel_type == "scanlation_group")
            .map(|rel| {
                let name = rel
                    .attributes
                    .and_then(|attr| attr.name)
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| rel.id.clone());
                Group::new(rel.id, name)
            })
            .collect();

        ChapterRecord {
            id: data.id,
            chapter: data.attributes.chapter,
            language: data.attributes.translated_language,
            created_at: data.attributes.created_at,
            groups,
        }
    }

    fn map_manifest(
        chapter_id: &str,
        response: MangaDexAtHomeResponse,
        quality: Quality,
    ) -> Result<AssetManifest> {
        if response.base_url.is_empty() {
            return Err(Error::manifest(chapter_id, "base URL is empty"));
        }
        if response.chapter.hash.is_empty() {
            return Err(Error::manifest(chapter_id, "chapter hash is empty"));
        }

        let filenames = match quality {
            Quality::Data => response.chapter.data,
            Quality::DataSaver => response.chapter.data_saver,
        };
        if filenames.is_empty() {
            return Err(Error::manifest(
                chapter_id,
                format!("no pages at {} quality", quality),
            ));
        }

        Ok(AssetManifest {
            base_url: response.base_url,
            hash: response.chapter.hash,
            filenames,
            quality,
        })
    }
}

impl Default for MangaDexSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogSource for MangaDexSource {
    fn id(&self) -> &'static str {
        "mgd"
    }

    async fn fetch_catalog_page(
        &self,
        work_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<CatalogPage> {
        let url = format!(
            "{}/manga/{}/feed?{}",
            self.api_base,
            work_id,
            Self::format_feed_query(offset, limit)
        );

        let response: MangaDexFeedResponse = self
            .client
            .get_json(&url)
            .await
            .map_err(|e| Error::catalog_fetch(work_id, e))?;

        let received = response.data.len();
        let has_more = received > 0 && offset + received < response.total;
        let records = response.data.into_iter().map(Self::map_chapter).collect();

        Ok(CatalogPage { records, has_more })
    }

    async fn resolve_manifest(&self, chapter_id: &str, quality: Quality) -> Result<AssetManifest> {
        let url = format!("{}/at-home/server/{}", self.api_base, chapter_id);
        let response: MangaDexAtHomeResponse = self
            .client
            .get_json(&url)
            .await
            .map_err(|e| Error::manifest(chapter_id, e))?;

        Self::map_manifest(chapter_id, response, quality)
    }

    async fn fetch_title(&self, work_id: &str) -> Result<String> {
        let url = format!("{}/manga/{}", self.api_base, work_id);
        let response: MangaDexMangaResponse = self.client.get_json(&url).await?;
        Ok(Self::extract_best_title(&response.data.attributes.title))
    }
}
