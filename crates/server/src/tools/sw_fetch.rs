//! sw_fetch tool implementation.
//!
//! Pushes one request through the active router and reports what the page
//! would have received.

use folio_client::fetch::resolve;
use folio_client::{FetchOutcome, Method, Request, RequestMode, ResponseSource};
use folio_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{WorkerHost, json_result};

fn default_method() -> String {
    "GET".to_string()
}

/// Parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the site origin.
    pub url: String,

    /// HTTP method (default: GET). Anything else passes through.
    #[serde(default = "default_method")]
    pub method: String,

    /// Treat the request as a page navigation.
    #[serde(default)]
    pub navigate: bool,
}

/// Output from the sw_fetch tool.
#[derive(Debug, Clone, Serialize)]
pub struct SwFetchOutput {
    pub url: String,
    /// False when the router let the request go to the network untouched.
    pub handled: bool,
    pub strategy: Option<String>,
    pub status: Option<u16>,
    pub source: Option<ResponseSource>,
    pub content_type: Option<String>,
    pub body: Option<String>,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(host: &WorkerHost, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let url = resolve(&host.config.origin, &params.url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;
    let method = Method::from_bytes(params.method.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| Error::InvalidInput(format!("invalid method: {}", params.method)))?;
    let request = if params.navigate {
        let mut request = Request::navigate(url);
        request.method = method;
        request
    } else {
        Request::new(method, url, RequestMode::Cors)
    };

    let strategy = match host.registration.active().await {
        Some(router) => router.classify(&request).map(|s| s.to_string()),
        None => None,
    };

    let output = match host.registration.fetch(&request).await {
        FetchOutcome::Passthrough => SwFetchOutput {
            url: request.url.to_string(),
            handled: false,
            strategy: None,
            status: None,
            source: None,
            content_type: None,
            body: None,
        },
        FetchOutcome::Respond(response) => SwFetchOutput {
            url: request.url.to_string(),
            handled: true,
            strategy,
            status: Some(response.status.as_u16()),
            source: Some(response.source),
            content_type: response.content_type().map(str::to_string),
            body: Some(response.text()),
        },
    };

    json_result(&output)
}
