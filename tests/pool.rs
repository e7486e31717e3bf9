//! Fetch pool tests

use std::time::Duration;
use tempfile::TempDir;

use shuroku::error::Error;
use shuroku::pool::{PAGE_CONCURRENCY, fetch_all, plan_tasks};
use shuroku::types::{AssetManifest, Quality};

mod common;
use common::{FakeFetcher, PAGE_HOST, page_body};

fn manifest(pages: usize) -> AssetManifest {
    AssetManifest {
        base_url: PAGE_HOST.to_string(),
        hash: "h".to_string(),
        filenames: (1..=pages).map(|i| format!("p{}.png", i)).collect(),
        quality: Quality::Data,
    }
}

#[cfg(test)]
mod pool_tests {
    use super::*;

    #[tokio::test]
    async fn test_results_align_with_tasks() {
        let scratch = TempDir::new().unwrap();
        let tasks = plan_tasks(&manifest(6), scratch.path());
        // Reverse completion order: the first page is the slowest
        let fetcher = FakeFetcher::new()
            .delaying("/p1.png", Duration::from_millis(60))
            .delaying("/p2.png", Duration::from_millis(45))
            .delaying("/p3.png", Duration::from_millis(30))
            .delaying("/p4.png", Duration::from_millis(15));

        let results = fetch_all(&fetcher, &tasks, 3).await;

        assert_eq!(results.len(), tasks.len());
        for (task, result) in tasks.iter().zip(&results) {
            let bytes = result.as_ref().unwrap();
            assert_eq!(bytes, &page_body(&task.url));
            assert_eq!(std::fs::read(&task.slot).unwrap(), bytes.to_vec());
        }
        // Completion order really did differ from task order
        assert_ne!(fetcher.requests()[0], tasks[0].url);
    }

    #[tokio::test]
    async fn test_in_flight_requests_never_exceed_limit() {
        let scratch = TempDir::new().unwrap();
        let tasks = plan_tasks(&manifest(20), scratch.path());
        let fetcher = FakeFetcher::new().delaying("/p", Duration::from_millis(10));

        let results = fetch_all(&fetcher, &tasks, PAGE_CONCURRENCY).await;

        assert!(results.iter().all(Result::is_ok));
        assert!(fetcher.peak() <= PAGE_CONCURRENCY);
        assert!(fetcher.peak() > 1);
    }

    #[tokio::test]
    async fn test_zero_limit_still_makes_progress() {
        let scratch = TempDir::new().unwrap();
        let tasks = plan_tasks(&manifest(3), scratch.path());
        let fetcher = FakeFetcher::new();

        let results = fetch_all(&fetcher, &tasks, 0).await;

        assert_eq!(results.len(), 3);
        assert_eq!(fetcher.peak(), 1);
    }

    #[tokio::test]
    async fn test_failed_page_keeps_its_position() {
        let scratch = TempDir::new().unwrap();
        let tasks = plan_tasks(&manifest(4), scratch.path());
        let fetcher = FakeFetcher::new().failing_on("/p3.png");

        let results = fetch_all(&fetcher, &tasks, 2).await;

        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        assert!(matches!(results[2], Err(Error::AssetFetch { index: 3, .. })));
        assert!(results[3].is_ok());
        assert_eq!(fetcher.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_empty_task_list() {
        let fetcher = FakeFetcher::new();
        let results = fetch_all(&fetcher, &[], PAGE_CONCURRENCY).await;
        assert!(results.is_empty());
    }
}
