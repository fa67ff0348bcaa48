//! MCP server handler implementation.
//!
//! This module defines the server handler that routes tool calls to the
//! worker host shared by every tool.

use std::sync::Arc;

use crate::tools::cache::{CacheGetParams, CachePurgeParams, get_impl, purge_impl};
use crate::tools::sw_events::{message_impl, push_impl, submit_impl, sync_impl};
use crate::tools::sw_fetch::fetch_impl;
use crate::tools::sw_lifecycle::{activate_impl, install_impl};
use crate::tools::{
    SwFetchParams, SwInstallParams, SwMessageParams, SwPushParams, SwSubmitParams, SwSyncParams, WorkerHost,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The MCP server handler for folio-sw.
#[derive(Clone)]
pub struct FolioServer {
    tool_router: ToolRouter<Self>,
    host: Arc<WorkerHost>,
}

#[tool_router]
impl FolioServer {
    pub fn new(host: WorkerHost) -> Self {
        Self { tool_router: Self::tool_router(), host: Arc::new(host) }
    }

    /// Install a worker version: precache the manifest and park it as waiting.
    #[tool(description = "Install a worker version. Precaches the manifest into the versioned store and leaves the worker waiting. Strict mode fails on any precache error.")]
    async fn sw_install(&self, params: Parameters<SwInstallParams>) -> Result<CallToolResult, McpError> {
        install_impl(&self.host, params.0).await
    }

    #[tool(description = "Activate the waiting worker. Deletes cache stores of every other version and takes control of fetches.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.host).await
    }

    /// Route one request through the active worker.
    #[tool(description = "Send a request through the active worker. Reports whether it was handled, the strategy used, the response status, source (network, cache, offline, synthetic) and body.")]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.host, params.0).await
    }

    #[tool(description = "Fire a background sync event. Replays queued submissions; delivered ones are removed, failed ones stay queued.")]
    async fn sw_sync(&self, params: Parameters<SwSyncParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.host, params.0).await
    }

    #[tool(description = "Deliver a push event and return the notification it shows. Optionally simulate a click on one of its actions.")]
    async fn sw_push(&self, params: Parameters<SwPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.host, params.0).await
    }

    #[tool(description = "Post a page message to the worker: SKIP_WAITING, GET_VERSION or PERFORMANCE_METRIC.")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.host, params.0).await
    }

    /// Submit a form; queued for background sync when delivery fails.
    #[tool(description = "POST a submission through the active worker. Delivered immediately when online, otherwise queued for background sync.")]
    async fn sw_submit(&self, params: Parameters<SwSubmitParams>) -> Result<CallToolResult, McpError> {
        submit_impl(&self.host, params.0).await
    }

    #[tool(description = "Read a cached response by URL, or list the entries of a cache store.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.host, params.0).await
    }

    #[tool(description = "Purge a cache store by domain or entry count, or drop it entirely.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.host, params.0).await
    }
}

impl ServerHandler for FolioServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "folio-sw".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Offline request router for a portfolio site. Run sw_install then sw_activate before sw_fetch.".into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
