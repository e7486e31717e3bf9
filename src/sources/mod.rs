//! Catalog source implementations with conditional compilation support.
//!
//! Each source sits behind its own feature flag so minimal builds can leave it
//! out and plug in their own [`CatalogSource`](crate::source::CatalogSource):
//!
//! - `source-mangadex` - Enables [`MangaDexSource`] (default)
//!
//! ```bash
//! cargo build --no-default-features
//! ```

#[cfg(feature = "source-mangadex")]
pub mod mangadex;

#[cfg(feature = "source-mangadex")]
pub use mangadex::MangaDexSource;
