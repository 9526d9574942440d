//! worker_fetch tool implementation.
//!
//! Routes one request through the worker. Requests the worker does not
//! intercept are sent to the network as-is, the way a browser would.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{Method, Request, Response};
use shellcache_worker::{FetchOutcome, ServiceWorker, Source, Strategy};

use super::json_result;

/// Bytes of the body echoed back as text.
const PREVIEW_BYTES: usize = 512;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchParams {
    /// Absolute URL, or a path relative to the configured origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchOutput {
    pub url: String,
    /// Whether the worker handled the request rather than passing it through.
    pub intercepted: bool,
    /// Manifest path the request resolved to.
    pub key: Option<String>,
    pub strategy: Option<Strategy>,
    pub source: Source,
    pub status: u16,
    pub content_type: Option<String>,
    pub body_len: usize,
    /// Leading bytes of the body, lossily decoded as UTF-8.
    pub preview: String,
}

impl WorkerFetchOutput {
    fn new(url: String, response: &Response, source: Source) -> Self {
        let head = &response.body[..response.body.len().min(PREVIEW_BYTES)];
        Self {
            url,
            intercepted: false,
            key: None,
            strategy: None,
            source,
            status: response.status,
            content_type: response.content_type().map(str::to_string),
            body_len: response.body.len(),
            preview: String::from_utf8_lossy(head).into_owned(),
        }
    }
}

pub async fn fetch_impl(worker: &ServiceWorker, params: WorkerFetchParams) -> Result<CallToolResult, McpError> {
    let method: Method = params.method.as_deref().unwrap_or("GET").parse()?;
    let url = worker.context().origin.absolutize(&params.url)?;
    let request = Request::new(method, url);

    let output = match worker.fetch(&request).await? {
        FetchOutcome::Respond(routed) => WorkerFetchOutput {
            intercepted: true,
            key: Some(routed.key),
            strategy: Some(routed.strategy),
            ..WorkerFetchOutput::new(request.url, &routed.response, routed.source)
        },
        FetchOutcome::Passthrough => {
            tracing::debug!(url = %request.url, "passthrough");
            let response = worker.context().network.fetch(&request).await?;
            WorkerFetchOutput::new(request.url, &response, Source::Network)
        }
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{json, worker};

    fn params(url: &str) -> WorkerFetchParams {
        WorkerFetchParams { url: url.into(), method: None }
    }

    async fn activated() -> (std::sync::Arc<ServiceWorker>, std::sync::Arc<crate::tools::testing::StubNetwork>) {
        let (sw, net) = worker();
        sw.install().await.unwrap();
        sw.activate().await.unwrap();
        (sw, net)
    }

    #[tokio::test]
    async fn test_not_activated_passes_through() {
        let (sw, _) = worker();
        let out = json(&fetch_impl(&sw, params("main.dart.js")).await.unwrap());

        assert_eq!(out["intercepted"], false);
        assert_eq!(out["source"], "network");
        assert_eq!(out["status"], 200);
    }

    #[tokio::test]
    async fn test_core_resource_served_from_cache() {
        let (sw, net) = activated().await;
        *net.offline.lock().unwrap() = true;

        let out = json(&fetch_impl(&sw, params("https://shop.example/main.dart.js?v=42")).await.unwrap());
        assert_eq!(out["intercepted"], true);
        assert_eq!(out["key"], "main.dart.js");
        assert_eq!(out["strategy"], "cache_first");
        assert_eq!(out["source"], "cache");
        assert_eq!(out["preview"], "main()");
    }

    #[tokio::test]
    async fn test_root_is_network_first() {
        let (sw, _) = activated().await;
        let out = json(&fetch_impl(&sw, params("/")).await.unwrap());

        assert_eq!(out["key"], "/");
        assert_eq!(out["strategy"], "network_first");
        assert_eq!(out["content_type"], "text/html");
    }

    #[tokio::test]
    async fn test_unknown_method_rejected() {
        let (sw, _) = worker();
        let err = fetch_impl(&sw, WorkerFetchParams { url: "/".into(), method: Some("BREW".into()) })
            .await
            .unwrap_err();
        assert_eq!(err.code.0, -32602);
    }

    #[tokio::test]
    async fn test_post_is_not_intercepted() {
        let (sw, _) = activated().await;
        let out = json(
            &fetch_impl(&sw, WorkerFetchParams { url: "main.dart.js".into(), method: Some("post".into()) })
                .await
                .unwrap(),
        );
        assert_eq!(out["intercepted"], false);
    }
}
