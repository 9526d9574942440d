//! MCP tool implementations.
//!
//! Each tool drives one entry point of the [`ServiceWorker`](shellcache_worker::ServiceWorker)
//! and reports the result as pretty-printed JSON text.

pub mod cache;
pub mod fetch;
pub mod lifecycle;
pub mod message;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

pub use cache::CacheListParams;
pub use fetch::WorkerFetchParams;
pub use message::WorkerMessageParams;

pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(ToolError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use rmcp::model::CallToolResult;
    use shellcache_core::{
        BuildManifest, Error, MemoryCache, NamespaceNames, Namespaces, Network, Origin, Request, Response,
    };
    use shellcache_worker::{ServiceWorker, WorkerContext};

    pub const ORIGIN: &str = "https://shop.example";

    /// Serves fixed bodies by exact URL; everything else is a 404.
    #[derive(Default)]
    pub struct StubNetwork {
        pub bodies: Mutex<HashMap<String, String>>,
        pub offline: Mutex<bool>,
    }

    #[async_trait]
    impl Network for StubNetwork {
        async fn fetch(&self, request: &Request) -> Result<Response, Error> {
            if *self.offline.lock().unwrap() {
                return Err(Error::Network(format!("{}: unreachable", request.url)));
            }
            let bare = request.url.split('?').next().unwrap_or(&request.url);
            Ok(match self.bodies.lock().unwrap().get(bare) {
                Some(body) => Response::new(&request.url, 200, body.clone()).with_header("content-type", "text/html"),
                None => Response::new(&request.url, 404, "not found"),
            })
        }
    }

    pub fn worker() -> (Arc<ServiceWorker>, Arc<StubNetwork>) {
        let origin = Origin::parse(ORIGIN).unwrap();
        let network = Arc::new(StubNetwork::default());
        for (path, body) in [("/", "<html>shell</html>"), ("index.html", "<html>shell</html>"), ("main.dart.js", "main()")] {
            network.bodies.lock().unwrap().insert(origin.resolve(path), body.to_string());
        }

        let manifest = BuildManifest::from_json(
            br#"{"resources":{"/":"h1","index.html":"h1","main.dart.js":"h2"},"core":["main.dart.js","index.html"]}"#,
        )
        .unwrap();

        let worker = ServiceWorker::new(WorkerContext {
            manifest: Arc::new(manifest),
            origin,
            namespaces: Namespaces::new(Arc::new(MemoryCache::new()), NamespaceNames::default()),
            network: network.clone(),
        });
        (Arc::new(worker), network)
    }

    pub fn json(result: &CallToolResult) -> serde_json::Value {
        let text = result.content.first().and_then(|c| c.as_text()).expect("text content");
        serde_json::from_str(&text.text).unwrap()
    }
}
