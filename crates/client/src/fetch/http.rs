//! Request and response values flowing through the router.

use bytes::Bytes;
use folio_core::{CachedEntry, Error};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use url::Url;

/// How the page issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Full-page navigation (address bar, link click, reload).
    Navigate,
    SameOrigin,
    #[default]
    Cors,
    NoCors,
}

/// An intercepted outgoing request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub mode: RequestMode,
    pub headers: HeaderMap,
}

impl Request {
    pub fn new(method: Method, url: Url, mode: RequestMode) -> Self {
        Self { method, url, mode, headers: HeaderMap::new() }
    }

    /// Subresource GET (script, image, XHR).
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url, RequestMode::Cors)
    }

    /// Page navigation GET.
    pub fn navigate(url: Url) -> Self {
        let mut request = Self::new(Method::GET, url, RequestMode::Navigate);
        request.headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        request
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }
}

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseSource {
    Network,
    Cache,
    /// The cached or built-in offline document.
    Offline,
    /// Generated by the router (404 / 408).
    Synthetic,
}

/// A response handed back to the page.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub source: ResponseSource,
}

impl Response {
    /// Response generated by the router itself.
    pub fn synthetic(status: StatusCode, content_type: &'static str, body: &'static str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        Self { status, headers, body: Bytes::from_static(body.as_bytes()), source: ResponseSource::Synthetic }
    }

    /// Resource absent from both network and cache.
    pub fn not_found() -> Self {
        Self::synthetic(StatusCode::NOT_FOUND, "text/plain", "Not found")
    }

    /// Catch-all for failures escaping a strategy.
    pub fn request_timeout() -> Self {
        Self::synthetic(StatusCode::REQUEST_TIMEOUT, "text/plain", "Network error happened")
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Rebuild a response from a stored entry.
    ///
    /// Headers that are no longer valid are dropped rather than failing the lookup.
    pub fn from_entry(entry: CachedEntry) -> Result<Self, Error> {
        let status = StatusCode::from_u16(entry.status)
            .map_err(|e| Error::CorruptEntry(format!("{} {}: status: {e}", entry.method, entry.url)))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &entry.headers {
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => tracing::debug!(header = %name, url = %entry.url, "skipping invalid cached header"),
            }
        }

        Ok(Self { status, headers, body: Bytes::from(entry.body), source: ResponseSource::Cache })
    }

    /// Snapshot this response as a cache entry for `request` in `store`.
    pub fn to_entry(&self, store: &str, request: &Request) -> CachedEntry {
        let headers = self
            .headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();
        CachedEntry::new(
            store,
            request.method.as_str(),
            request.url.as_str(),
            self.status.as_u16(),
            headers,
            self.body.to_vec(),
        )
    }
}
