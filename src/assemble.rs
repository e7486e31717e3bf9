//! Turning the pages of one chapter into a single document.
//!
//! The pipeline hands an [`Assembler`] the page bytes in reading order and
//! writes whatever it returns to disk. [`CbzAssembler`] is the default: a zip
//! archive of the images, readable by every comic viewer.
//!
//! # Examples
//!
//! ```rust
//! use bytes::Bytes;
//! use shuroku::assemble::{Assembler, CbzAssembler};
//!
//! let png = Bytes::from_static(b"\x89PNG\r\n\x1a\n....");
//! let document = CbzAssembler::default().assemble(&[png]).unwrap();
//! assert!(document.starts_with(b"PK"));
//! ```

use bytes::Bytes;
use std::io::{Cursor, Write};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::error::{Error, Result};

/// Builds one document from ordered page images.
///
/// Implementations are synchronous; the pipeline runs them on tokio's blocking
/// pool.
pub trait Assembler: Send + Sync {
    /// File extension of the produced documents, without the dot.
    fn extension(&self) -> &'static str;

    /// Assembles `pages` (reading order) into document bytes.
    fn assemble(&self, pages: &[Bytes]) -> Result<Vec<u8>>;
}

/// Packs pages into a CBZ archive.
///
/// Entries are named `001.jpg`, `002.png`, ... after their position, so viewers
/// that sort by name read them in order. Images are already compressed, so
/// entries are stored unless `compress` is set.
#[derive(Debug, Clone, Default)]
pub struct CbzAssembler {
    pub compress: bool,
}

impl CbzAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

impl Assembler for CbzAssembler {
    fn extension(&self) -> &'static str {
        "cbz"
    }

    fn assemble(&self, pages: &[Bytes]) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(Error::assembly("chapter has no pages"));
        }

        let method = if self.compress {
            CompressionMethod::Deflated
        } else {
            CompressionMethod::Stored
        };
        let options = SimpleFileOptions::default().compression_method(method);

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (i, page) in pages.iter().enumerate() {
            let kind = image_kind(page).ok_or_else(|| {
                Error::assembly(format!("page {} is not a supported image", i + 1))
            })?;
            zip.start_file(format!("{:03}.{}", i + 1, kind), options)?;
            zip.write_all(page)?;
        }

        Ok(zip.finish()?.into_inner())
    }
}

/// Recognizes the image formats served by the page servers from their magic
/// bytes, returning the usual extension.
pub fn image_kind(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("jpg"),
        [0x89, b'P', b'N', b'G', ..] => Some("png"),
        [b'G', b'I', b'F', b'8', ..] => Some("gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("webp"),
        _ => None,
    }
}
