//! HTTP client tests against a local server

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use shuroku::error::Error;
use shuroku::net::HttpClient;
use shuroku::source::AssetFetcher;

mod common;
use common::PNG_MAGIC;

/// Serves `/page.png`, `/meta.json`, `/referer` (echoes the Referer header)
/// and `/flaky` (503 once, then 200);
/// everything else is a 404.
fn serve() -> String {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let flaky_hits = Arc::new(AtomicUsize::new(0));

    thread::spawn(move || {
        for request in server.incoming_requests() {
            let referer = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Referer"))
                .map(|h| h.value.as_str().to_string())
                .unwrap_or_default();
            let response = match request.url() {
                "/referer" => tiny_http::Response::from_data(referer.into_bytes()),
                "/page.png" => tiny_http::Response::from_data(PNG_MAGIC.to_vec()),
                "/meta.json" => tiny_http::Response::from_data(br#"{"pages":3}"#.to_vec()),
                "/flaky" if flaky_hits.fetch_add(1, Ordering::SeqCst) == 0 => {
                    tiny_http::Response::from_data(b"busy".to_vec()).with_status_code(503)
                }
                "/flaky" => tiny_http::Response::from_data(b"ok".to_vec()),
                _ => tiny_http::Response::from_data(b"missing".to_vec()).with_status_code(404),
            };
            let _ = request.respond(response);
        }
    });

    format!("http://{}", addr)
}

#[cfg(test)]
mod http_tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let base = serve();
        let client = HttpClient::new("test").with_rate_limit(0);

        let bytes = client.fetch(&format!("{}/page.png", base)).await.unwrap();
        assert_eq!(bytes.as_ref(), PNG_MAGIC);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let base = serve();
        let client = HttpClient::new("test").with_rate_limit(0).with_max_retries(3);

        let err = client.fetch(&format!("{}/nope.png", base)).await.unwrap_err();
        match err {
            Error::Source { src, message } => {
                assert_eq!(src, "test");
                assert!(message.contains("404"));
                assert!(message.contains("/nope.png"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let base = serve();
        let client = HttpClient::new("test").with_rate_limit(0).with_max_retries(1);

        let bytes = client.get(&format!("{}/flaky", base)).await.unwrap();
        assert_eq!(bytes.as_ref(), b"ok");
    }

    #[tokio::test]
    async fn test_get_json() {
        #[derive(serde::Deserialize)]
        struct Meta {
            pages: usize,
        }

        let base = serve();
        let client = HttpClient::new("test").with_rate_limit(0);

        let meta: Meta = client.get_json(&format!("{}/meta.json", base)).await.unwrap();
        assert_eq!(meta.pages, 3);
    }

    #[tokio::test]
    async fn test_configured_headers_are_sent() {
        let base = serve();
        let client = HttpClient::new("test")
            .with_rate_limit(0)
            .with_header("Referer", "https://mangadex.org/");

        let bytes = client.get(&format!("{}/referer", base)).await.unwrap();
        assert_eq!(bytes.as_ref(), b"https://mangadex.org/");
    }
}
