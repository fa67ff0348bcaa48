//! Network seam for the router.
//!
//! The router never talks to reqwest directly; it goes through [`Network`],
//! so strategies can be exercised against scripted fakes.
//!
//! ### Failure semantics
//! - A transport failure (offline, DNS, reset) is an `Err`.
//! - An HTTP error status is still an `Ok` response, as with the browser
//!   fetch API; callers decide whether a non-2xx status is cacheable.

pub mod http;
pub mod url;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, header};

pub use http::{Request, RequestMode, Response, ResponseSource};
pub use reqwest::{Method, StatusCode};
pub use self::url::{UrlError, is_fetchable_scheme, resolve, same_origin};

use folio_core::{AppConfig, Error};

/// Configuration for [`HttpNetwork`].
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "folio-sw/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "folio-sw/0.1".to_string(), timeout: Duration::from_millis(20000), max_redirects: 5 }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), timeout: config.timeout(), ..Default::default() }
    }
}

/// Outgoing network access used by the router.
#[async_trait]
pub trait Network: Send + Sync {
    /// Perform the request and return whatever the server answered.
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;

    /// Deliver a replayed submission.
    async fn post(&self, url: &::url::Url, body: &str, content_type: &str) -> Result<StatusCode, Error>;
}

fn map_send_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(err.to_string())
    } else {
        Error::NetworkFailed(err.to_string())
    }
}

/// reqwest-backed [`Network`].
pub struct HttpNetwork {
    http: Client,
    config: FetchConfig,
}

impl HttpNetwork {
    /// Create a new network client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::NetworkFailed(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();

        let response = self
            .http
            .request(request.method.clone(), request.url.as_str())
            .headers(request.headers.clone())
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        let headers = response.headers().clone();

        let body: Bytes = response.bytes().await.map_err(map_send_error)?;

        tracing::debug!(
            url = %request.url,
            status = status.as_u16(),
            bytes = body.len(),
            fetch_ms = start.elapsed().as_millis() as u64,
            "network fetch"
        );

        Ok(Response { status, headers, body, source: ResponseSource::Network })
    }

    async fn post(&self, url: &::url::Url, body: &str, content_type: &str) -> Result<StatusCode, Error> {
        let response = self
            .http
            .post(url.as_str())
            .header(header::CONTENT_TYPE, content_type)
            .body(body.to_string())
            .send()
            .await
            .map_err(map_send_error)?;

        Ok(response.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "folio-sw/0.1");
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { user_agent: "jane-portfolio/2".into(), timeout_ms: 5_000, ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.user_agent, "jane-portfolio/2");
        assert_eq!(config.timeout, Duration::from_millis(5_000));
    }

    #[tokio::test]
    async fn test_http_network_new() {
        let network = HttpNetwork::new(FetchConfig::default());
        assert!(network.is_ok());
    }
}
