//! cache_list tool implementation.
//!
//! Lists the entries stored in one of the worker's namespaces.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{NamespaceKind, cache::EntrySummary};
use shellcache_worker::ServiceWorker;

use crate::tools::json_result;

/// Parameters for the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListParams {
    /// Namespace to list: "staging", "content" or "metadata".
    pub namespace: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListOutput {
    /// Storage name of the namespace.
    pub name: String,
    pub exists: bool,
    pub entries: Vec<EntrySummary>,
}

pub async fn list_impl(worker: &ServiceWorker, params: CacheListParams) -> Result<CallToolResult, McpError> {
    let kind: NamespaceKind = params.namespace.parse()?;
    let namespaces = &worker.context().namespaces;

    let exists = namespaces.exists(kind).await?;
    let entries = if exists { namespaces.summary(kind).await? } else { Vec::new() };

    json_result(&CacheListOutput { name: namespaces.names().name(kind).to_string(), exists, entries })
}
