//! URL resolution for precache entries, fallbacks and tool input.

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Schemes the router is willing to intercept.
pub fn is_fetchable_scheme(url: &url::Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Resolve `input` against `origin`.
///
/// 1. Trim leading/trailing whitespace
/// 2. Absolute URLs are parsed as-is and must be http(s)
/// 3. Anything else is joined onto `origin` (`/offline.html`, `icons/a.png`)
/// 4. Remove fragment (#...), which never reaches the network
pub fn resolve(origin: &url::Url, input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = if trimmed.contains("://") {
        url::Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?
    } else {
        origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?
    };

    if !is_fetchable_scheme(&parsed) {
        return Err(UrlError::UnsupportedScheme(parsed.scheme().to_string()));
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Whether `url` shares scheme, host and port with `origin`.
pub fn same_origin(origin: &url::Url, url: &url::Url) -> bool {
    origin.origin() == url.origin()
}
