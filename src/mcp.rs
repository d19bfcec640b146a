use std::{sync::Arc, time::Duration};

use rmcp::{
    ServerHandler,
    ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult,
        Content,
        Implementation,
        ServerCapabilities,
        ServerInfo,
    },
    tool,
    tool_handler,
    tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    config::Config,
    error,
    expand::LinkStyle,
    index::IndexHandle,
    inventory,
    search::{self, DirectPage, InsertHit, SearchOptions},
};

struct SphinxState {
    index: IndexHandle,
    options: SearchOptions,
}

#[derive(Clone)]
pub struct SphinxMcpServer {
    state: Arc<SphinxState>,
    tool_router: ToolRouter<Self>,
}

impl SphinxMcpServer {
    fn new(state: SphinxState) -> Self {
        Self {
            state: Arc::new(state),
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router(router = tool_router)]
impl SphinxMcpServer {
    /// Rank documentation entries against a single query.
    #[tool(
        name = "sphinx_search",
        description = "Fuzzy-search the documentation inventory. Returns entries ranked by similarity with their links."
    )]
    pub async fn sphinx_search(
        &self,
        params: Parameters<SearchParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let mut options = self.state.options;
        if let Some(limit) = params.limit {
            if limit == 0 {
                return Err(rmcp::ErrorData::invalid_params(
                    "limit must be positive",
                    None,
                ));
            }
            options.page_size = limit;
        }

        let index = self.state.index.snapshot();
        let page = search::direct_search(
            &index,
            &params.query,
            params.page.unwrap_or(0),
            &options,
        )
        .map_err(|e| mcp_error("search failed", e))?;

        let summary = format_search_summary(&page);
        let structured = serde_json::to_value(&page)
            .map_err(|e| serialize_error("failed to serialize search results", e))?;

        Ok(structured_result(summary, structured))
    }

    /// Replace every marked query in a message with documentation links.
    #[tool(
        name = "sphinx_insert",
        description = "Resolve every query enclosed in the marker character (default '+') and return all combinations of the top matches as ready-to-send messages."
    )]
    pub async fn sphinx_insert(
        &self,
        params: Parameters<InsertParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let mut options = self.state.options;
        if let Some(k) = params.results_per_query {
            options.results_per_query = k;
        }
        if let Some(marker) = params.marker {
            options.marker = marker;
        }
        if params.markdown.unwrap_or(false) {
            options.link_style = LinkStyle::Markdown;
        }

        let index = self.state.index.snapshot();
        let hits = search::insert_search(&index, &params.message, &options)
            .map_err(|e| mcp_error("insert search failed", e))?;

        let summary = format_insert_summary(&hits);
        let structured = serde_json::to_value(InsertResponse {
            message: params.message,
            result_count: hits.len(),
            results: hits,
        })
        .map_err(|e| serialize_error("failed to serialize insert results", e))?;

        Ok(structured_result(summary, structured))
    }

    /// Describe the documentation that is currently loaded.
    #[tool(
        name = "sphinx_info",
        description = "Show the project name, version, documentation URL and entry counts of the loaded inventory."
    )]
    pub async fn sphinx_info(
        &self,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let index = self.state.index.snapshot();
        let info = search::info(&index);
        let summary = format!(
            "Documentation of {} {} ({} entries): {}",
            info.project, info.version, info.entries, info.base_url
        );
        let structured = serde_json::to_value(&info)
            .map_err(|e| serialize_error("failed to serialize info", e))?;

        Ok(structured_result(summary, structured))
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for SphinxMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut server_info = Implementation::from_build_env();
        server_info.name = "sphinxbert".to_string();
        server_info.title = Some("sphinxbert MCP".to_string());
        server_info.version = env!("CARGO_PKG_VERSION").to_string();

        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info = server_info;
        info.instructions = Some(
            "Use sphinx_search to find documentation entries by name. Use sphinx_insert to turn a message with +queries+ into linked text."
                .to_string(),
        );
        info
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Search query string.
    pub query: String,
    /// Result page, starting at 0.
    pub page: Option<usize>,
    /// Results per page (default: 50).
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertParams {
    /// Message containing queries enclosed in the marker character.
    pub message: String,
    /// Matches kept per query (default: 3).
    pub results_per_query: Option<usize>,
    /// Marker character (default: '+').
    pub marker: Option<char>,
    /// Render links as Markdown instead of HTML.
    pub markdown: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertResponse {
    message: String,
    result_count: usize,
    results: Vec<InsertHit>,
}

fn structured_result(
    summary: String,
    structured: serde_json::Value,
) -> CallToolResult {
    let mut result = CallToolResult::success(vec![Content::text(summary)]);
    result.structured_content = Some(structured);
    result
}

fn format_search_summary(page: &DirectPage) -> String {
    if page.results.is_empty() {
        return format!("No results found for \"{}\"", page.query);
    }

    let mut lines = Vec::with_capacity(page.results.len() + 1);
    let suffix = if page.total == 1 { "" } else { "s" };
    lines.push(format!(
        "Found {} result{} for \"{}\" (page {}):",
        page.total, suffix, page.query, page.page
    ));

    for hit in &page.results {
        lines.push(format!("{:.1} {} {}", hit.score, hit.name, hit.link));
    }

    lines.join("\n")
}

fn format_insert_summary(hits: &[InsertHit]) -> String {
    if hits.is_empty() {
        return "No combinations found".to_string();
    }

    let suffix = if hits.len() == 1 { "" } else { "s" };
    let mut lines = vec![format!("{} combination{suffix}:", hits.len())];
    lines.extend(hits.iter().map(|hit| hit.text.clone()));
    lines.join("\n")
}

fn mcp_error(message: &str, error: error::Error) -> rmcp::ErrorData {
    let data = Some(json!({ "error": error.to_string() }));
    match error {
        error::Error::InvalidArgument(_)
        | error::Error::QueryTooLong { .. }
        | error::Error::TooManyCombinations { .. } => {
            rmcp::ErrorData::invalid_params(message.to_string(), data)
        }
        _ => rmcp::ErrorData::internal_error(message.to_string(), data),
    }
}

fn serialize_error(
    message: &str,
    error: impl std::fmt::Display,
) -> rmcp::ErrorData {
    rmcp::ErrorData::internal_error(
        message.to_string(),
        Some(json!({ "error": error.to_string() })),
    )
}

/// Reload the inventory every `minutes` and swap it in. A failed reload
/// keeps serving the previous snapshot.
async fn refresh_loop(
    handle: IndexHandle,
    client: reqwest::Client,
    source: inventory::Source,
    base_url: String,
    minutes: u64,
) {
    let mut ticker =
        tokio::time::interval(Duration::from_secs(minutes.saturating_mul(60)));
    // The first tick fires immediately and the index is already loaded.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match inventory::load_source(&client, &source, &base_url).await {
            Ok(index) => handle.replace(index),
            Err(e) => tracing::warn!(
                source = %source,
                error = %e,
                "inventory refresh failed"
            ),
        }
    }
}

pub fn run_mcp(config: Config) -> error::Result<()> {
    let source = config.inventory_source()?;
    let client = inventory::http_client()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let index =
            inventory::load_source(&client, &source, &config.base_url).await?;
        let handle = IndexHandle::new(index);

        if config.refresh_minutes > 0 {
            tracing::info!(
                source = %source,
                minutes = config.refresh_minutes,
                "refreshing inventory periodically"
            );
            tokio::spawn(refresh_loop(
                handle.clone(),
                client,
                source,
                config.base_url.clone(),
                config.refresh_minutes,
            ));
        }

        let server = SphinxMcpServer::new(SphinxState {
            index: handle,
            options: config.search_options(),
        });

        let transport = rmcp::transport::stdio();
        let running = server.serve(transport).await.map_err(|e| {
            error::Error::Config(format!(
                "MCP server initialization failed: {e}"
            ))
        })?;
        running.waiting().await.map_err(|e| {
            error::Error::Config(format!("MCP server error: {e}"))
        })?;
        Ok(())
    })
}
