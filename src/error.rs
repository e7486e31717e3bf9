//! Error types and result handling for shuroku operations.
//!
//! Every fallible operation in the crate returns [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`.
//!
//! # Error Categories
//!
//! Errors fall into three tiers, depending on how far the acquisition pipeline
//! lets them travel:
//!
//! - **Run-level**: [`Error::CatalogFetch`] aborts the whole run, there is nothing
//!   to fall back to without a catalog. [`Error::InvalidRange`] is raised before
//!   any network activity starts.
//! - **Chapter-level**: [`Error::NotFound`] means the chapter has no candidates in
//!   the ranked selection; it is reported and the next chapter is processed.
//! - **Candidate-level**: [`Error::ManifestResolution`], [`Error::AssetFetch`] and
//!   [`Error::Assembly`] make the pipeline fall back to the next scanlation group.
//!
//! Transport errors (network, IO, JSON, ...) wrap the underlying library errors
//! and are classified by the layer that produced them.
//!
//! # Examples
//!
//! ```rust
//! use shuroku::error::{Error, Result};
//! use shuroku::catalog::ChapterRange;
//!
//! fn pick() -> Result<ChapterRange> {
//!     ChapterRange::parse("12", "3")
//! }
//!
//! match pick() {
//!     Ok(range) => println!("{range}"),
//!     Err(Error::InvalidRange(msg)) => println!("bad range: {msg}"),
//!     Err(e) => println!("other error: {e}"),
//! }
//! ```

use thiserror::Error;

/// Type alias for Results with shuroku errors.
///
/// ```rust
/// use shuroku::{Error, Result};
///
/// fn example_with_error() -> Result<()> {
///     Err(Error::parse("Something went wrong"))
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all shuroku operations.
///
/// # Variants
///
/// * [`CatalogFetch`](Error::CatalogFetch) - The chapter catalog could not be retrieved
/// * [`ManifestResolution`](Error::ManifestResolution) - A chapter's page list could not be resolved
/// * [`AssetFetch`](Error::AssetFetch) - A single page failed to download or to be stored
/// * [`Assembly`](Error::Assembly) - Pages could not be turned into a document
/// * [`NotFound`](Error::NotFound) - Missing chapters or resources
/// * [`InvalidRange`](Error::InvalidRange) - Malformed or empty chapter selection
/// * [`Network`](Error::Network) - HTTP client and connection errors
/// * [`Parse`](Error::Parse) - Data parsing and format errors
/// * [`Source`](Error::Source) - Source-specific errors with context
/// * [`RateLimit`](Error::RateLimit) - Rate limiting responses
/// * [`Io`](Error::Io) - File system and IO errors
/// * [`Json`](Error::Json) - JSON serialization errors
/// * [`Zip`](Error::Zip) - Archive writing errors
/// * [`Join`](Error::Join) - Blocking task failures
/// * [`Other`](Error::Other) - Generic error messages
#[derive(Error, Debug)]
pub enum Error {
    /// The remote catalog could not be fetched.
    ///
    /// This is fatal for a run: without the chapter list there is nothing to
    /// rank and nothing to fall back to.
    #[error("Catalog fetch failed for {work_id}: {message}")]
    CatalogFetch { work_id: String, message: String },

    /// The page manifest of one chapter could not be resolved.
    ///
    /// Recoverable at the candidate level: the pipeline moves on to the next
    /// scanlation group for the same chapter.
    #[error("Manifest resolution failed for chapter {chapter_id}: {message}")]
    ManifestResolution { chapter_id: String, message: String },

    /// One page of a chapter attempt failed.
    ///
    /// `index` is the 1-based page position inside the attempt. A single failed
    /// page fails the whole attempt; there are no partial chapters.
    #[error("Page {index} failed: {message}")]
    AssetFetch { index: usize, message: String },

    /// The downloaded pages could not be assembled into a document.
    #[error("Assembly failed: {0}")]
    Assembly(String),

    /// Resource not found errors.
    ///
    /// Used for chapters that are absent from the ranked selection and for
    /// missing remote resources.
    ///
    /// ```rust
    /// use shuroku::Error;
    ///
    /// let error = Error::not_found("Chapter 4");
    /// ```
    #[error("Not found: {0}")]
    NotFound(String),

    /// The requested chapter range is malformed or selects nothing.
    ///
    /// Always surfaced before any page download begins.
    #[error("Invalid chapter range: {0}")]
    InvalidRange(String),

    /// Network-related errors from HTTP operations.
    ///
    /// Wraps errors from reqwest: connection timeouts, DNS failures, TLS errors
    /// and interrupted bodies.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Data parsing and format errors.
    ///
    /// ```rust
    /// use shuroku::Error;
    ///
    /// let error = Error::parse("Invalid MangaDex URL");
    /// ```
    #[error("Parse error: {0}")]
    Parse(String),

    /// Source-specific errors with contextual information.
    ///
    /// # Fields
    ///
    /// * `src` - The identifier of the source that encountered the error
    /// * `message` - Descriptive error message explaining what went wrong
    #[error("Source error [{src}]: {message}")]
    Source { src: String, message: String },

    /// The remote side throttled us and retries were exhausted.
    ///
    /// `retry_after` comes from the `Retry-After` header when present.
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimit { retry_after: Option<u64> },

    /// File system and IO operation errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization and deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors while writing a zip based document.
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Join errors from blocking tasks.
    #[error("Join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Generic error messages.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates a parse error with the given message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Creates a source-specific error with source ID and message.
    ///
    /// ```rust
    /// use shuroku::Error;
    ///
    /// let error = Error::source("mangadex", "HTTP 503 Service Unavailable");
    /// ```
    pub fn source(src: impl Into<String>, msg: impl Into<String>) -> Self {
        Error::Source {
            src: src.into(),
            message: msg.into(),
        }
    }

    /// Creates a not found error with the given message.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Creates a rate limit error with optional retry-after time.
    pub fn rate_limit(retry_after: Option<u64>) -> Self {
        Error::RateLimit { retry_after }
    }

    /// Creates a catalog fetch error for the given work.
    pub fn catalog_fetch(work_id: impl Into<String>, msg: impl ToString) -> Self {
        Error::CatalogFetch {
            work_id: work_id.into(),
            message: msg.to_string(),
        }
    }

    /// Creates a manifest resolution error for the given remote chapter id.
    pub fn manifest(chapter_id: impl Into<String>, msg: impl ToString) -> Self {
        Error::ManifestResolution {
            chapter_id: chapter_id.into(),
            message: msg.to_string(),
        }
    }

    /// Creates a page fetch error for the 1-based page `index`.
    pub fn asset_fetch(index: usize, msg: impl ToString) -> Self {
        Error::AssetFetch {
            index,
            message: msg.to_string(),
        }
    }

    /// Creates an assembly error.
    pub fn assembly(msg: impl Into<String>) -> Self {
        Error::Assembly(msg.into())
    }

    /// Creates an invalid range error.
    ///
    /// ```rust
    /// use shuroku::Error;
    ///
    /// let error = Error::invalid_range("start 12 is after end 3");
    /// assert!(!error.is_recoverable());
    /// ```
    pub fn invalid_range(msg: impl Into<String>) -> Self {
        Error::InvalidRange(msg.into())
    }

    /// Whether a run can continue past this error.
    ///
    /// Candidate-level and chapter-level errors only cost one attempt or one
    /// chapter. Catalog failures and invalid ranges happen before any chapter
    /// is attempted and end the run.
    ///
    /// The acquisition pipeline does not consult this: every error it sees
    /// from an attempt is candidate-level and leads to the next candidate.
    ///
    /// ```rust
    /// use shuroku::Error;
    ///
    /// assert!(Error::asset_fetch(3, "HTTP 404").is_recoverable());
    /// assert!(!Error::catalog_fetch("abc", "HTTP 500").is_recoverable());
    /// ```
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::CatalogFetch { .. } | Error::InvalidRange(_))
    }
}
