//! Bounded-concurrency page fetching for one chapter attempt.
//!
//! [`fetch_all`] keeps at most `limit` page downloads in flight, stores each
//! page in its scratch slot, and hands back one result per task aligned with
//! the input order, whatever order the downloads finished in. Deciding whether
//! a partial set of pages is usable is left to the caller; the pipeline never
//! accepts one.

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::path::Path;

use crate::{
    download::extract_extension,
    error::{Error, Result},
    source::AssetFetcher,
    types::{AssetManifest, AssetTask},
};

/// Page downloads in flight per chapter attempt.
///
/// Higher values trip the page servers' rate limits, lower ones serialize the
/// attempt for no gain.
pub const PAGE_CONCURRENCY: usize = 5;

/// Builds one task per manifest entry, numbered from 1 in manifest order.
///
/// Slot names carry the index (`001.png`, `002.jpg`, ...) so scratch files never
/// collide; they are a storage detail and never used to decide page order.
pub fn plan_tasks(manifest: &AssetManifest, scratch: &Path) -> Vec<AssetTask> {
    manifest
        .filenames
        .iter()
        .enumerate()
        .map(|(i, filename)| {
            let index = i + 1;
            let slot = match extract_extension(filename) {
                Some(ext) => format!("{:03}.{}", index, ext),
                None => format!("{:03}", index),
            };
            AssetTask {
                index,
                url: manifest.url_for(filename),
                slot: scratch.join(slot),
            }
        })
        .collect()
}

/// Fetches every task with at most `limit` requests in flight.
///
/// The returned vector has one entry per task, at the same position as the
/// task. Every task runs to completion even after a sibling failed.
pub async fn fetch_all<F>(fetcher: &F, tasks: &[AssetTask], limit: usize) -> Vec<Result<Bytes>>
where
    F: AssetFetcher + ?Sized,
{
    let mut finished: Vec<(usize, Result<Bytes>)> = stream::iter(tasks.iter().enumerate())
        .map(|(position, task)| async move { (position, fetch_one(fetcher, task).await) })
        .buffer_unordered(limit.max(1))
        .collect()
        .await;

    finished.sort_by_key(|(position, _)| *position);
    finished.into_iter().map(|(_, result)| result).collect()
}

async fn fetch_one<F>(fetcher: &F, task: &AssetTask) -> Result<Bytes>
where
    F: AssetFetcher + ?Sized,
{
    let bytes = fetcher
        .fetch(&task.url)
        .await
        .map_err(|e| Error::asset_fetch(task.index, e))?;

    if bytes.is_empty() {
        return Err(Error::asset_fetch(task.index, "empty response body"));
    }

    tokio::fs::write(&task.slot, &bytes).await.map_err(|e| {
        Error::asset_fetch(
            task.index,
            format!("failed to store {}: {}", task.slot.display(), e),
        )
    })?;

    tracing::trace!(index = task.index, bytes = bytes.len(), "page stored");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Quality;

    fn manifest(files: &[&str]) -> AssetManifest {
        AssetManifest {
            base_url: "https://node.example".to_string(),
            hash: "h".to_string(),
            filenames: files.iter().map(|f| f.to_string()).collect(),
            quality: Quality::Data,
        }
    }

    #[test]
    fn test_plan_tasks_numbers_from_one() {
        let tasks = plan_tasks(&manifest(&["x9.png", "a1.jpg", "noext"]), Path::new("/tmp/s"));

        let indices: Vec<usize> = tasks.iter().map(|t| t.index).collect();
        assert_eq!(indices, [1, 2, 3]);
        assert_eq!(tasks[0].url, "https://node.example/data/h/x9.png");
        assert_eq!(tasks[0].slot, Path::new("/tmp/s/001.png"));
        assert_eq!(tasks[1].slot, Path::new("/tmp/s/002.jpg"));
        assert_eq!(tasks[2].slot, Path::new("/tmp/s/003"));
    }
}
