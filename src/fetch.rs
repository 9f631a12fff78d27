//! Product page fetching
//!
//! A single GET per call with a browser-like identity. No retries, no proxy
//! rotation; a failed fetch is returned to the caller, which decides how loud
//! to be about it.

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Source of raw product page markup
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the markup behind `url`
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// reqwest-backed fetcher
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a new fetcher
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        let language = HeaderValue::from_str(&config.accept_language)
            .map_err(|e| Error::Config(format!("Invalid fetch.accept_language: {}", e)))?;
        headers.insert(ACCEPT_LANGUAGE, language);

        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .gzip(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(5));

        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder
            .build()
            .map_err(|e| Error::Fetch(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!("Fetching: {}", url);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("HTTP {}: {}", status, url)));
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_sends_browser_identity() {
        let mock_server = MockServer::start().await;
        let config = FetchConfig::default();

        Mock::given(method("GET"))
            .and(path("/dp/B0001"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(b"<html>ok</html>".to_vec(), "text/html"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new(&config).unwrap();
        let body = fetcher
            .fetch(&format!("{}/dp/B0001", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html>ok</html>");

        let requests = mock_server.received_requests().await.unwrap();
        let header = |name: &str| {
            requests[0]
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        assert_eq!(header("user-agent"), Some(config.user_agent.clone()));
        assert_eq!(header("accept-language"), Some("en-US,en;q=0.9".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_non_success_is_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
        let result = fetcher.fetch(&format!("{}/dp/B0002", mock_server.uri())).await;
        assert!(matches!(result, Err(Error::Fetch(_))));
    }

    #[tokio::test]
    async fn test_fetch_transport_error() {
        let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
        // port 9 (discard) on localhost is not listening
        let result = fetcher.fetch("http://127.0.0.1:9/dp/none").await;
        assert!(result.is_err());
    }
}
