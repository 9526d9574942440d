//! Bulk download of every manifest resource missing from Content.
//!
//! All-or-nothing: the batch is fetched concurrently and only stored once
//! every response arrived with a successful status.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::try_join_all;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{Error, NamespaceKind, Request, Response};

use crate::WorkerContext;
use crate::keys::stored_path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MaterializeReport {
    pub fetched: Vec<String>,
}

#[derive(Clone)]
pub struct OfflineMaterializer {
    ctx: Arc<WorkerContext>,
}

impl OfflineMaterializer {
    pub fn new(ctx: Arc<WorkerContext>) -> Self {
        Self { ctx }
    }

    /// Manifest paths with no entry in Content, in manifest order.
    pub async fn missing_paths(&self) -> Result<Vec<String>, Error> {
        let content = self.ctx.namespaces.open(NamespaceKind::Content).await?;
        let present: HashSet<String> = content
            .keys()
            .await?
            .iter()
            .map(|request| stored_path(&self.ctx.origin, &request.url))
            .collect();

        Ok(self
            .ctx
            .manifest
            .resources
            .paths()
            .filter(|path| !present.contains(*path))
            .map(str::to_string)
            .collect())
    }

    pub async fn materialize(&self) -> Result<MaterializeReport, Error> {
        let missing = self.missing_paths().await?;
        if missing.is_empty() {
            tracing::debug!("every manifest resource already cached");
            return Ok(MaterializeReport::default());
        }

        let fetches = missing.iter().map(|path| self.fetch_ok(path));
        let responses = try_join_all(fetches).await?;

        let content = self.ctx.namespaces.open(NamespaceKind::Content).await?;
        for (request, response) in &responses {
            content.put(request, response).await?;
        }

        tracing::info!(fetched = missing.len(), "offline materialization complete");
        Ok(MaterializeReport { fetched: missing })
    }

    async fn fetch_ok(&self, path: &str) -> Result<(Request, Response), Error> {
        let request = Request::get(self.ctx.origin.resolve(path));
        let response = self.ctx.network.fetch(&request).await?;
        if !response.ok() {
            return Err(Error::HttpStatus { url: request.url, status: response.status });
        }
        Ok((request, response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeNetwork, build, context, stored_paths, url};
    use shellcache_core::MemoryCache;

    const MANIFEST: &[(&str, &str)] = &[("/", "h1"), ("index.html", "h1"), ("main.dart.js", "h2"), ("assets/logo.png", "h3")];

    fn materializer(network: Arc<FakeNetwork>) -> OfflineMaterializer {
        OfflineMaterializer::new(context(build(MANIFEST, &["main.dart.js"]), Arc::new(MemoryCache::new()), network))
    }

    fn network() -> Arc<FakeNetwork> {
        FakeNetwork::serving(&[("/", "<html>"), ("index.html", "<html>"), ("main.dart.js", "main()"), ("assets/logo.png", "png")])
    }

    #[tokio::test]
    async fn test_fetches_only_missing() {
        let net = network();
        let m = materializer(net.clone());
        let content = m.ctx.namespaces.open(NamespaceKind::Content).await.unwrap();
        let cached = Request::get(url("main.dart.js"));
        content.put(&cached, &Response::new(&cached.url, 200, "main()")).await.unwrap();

        let report = m.materialize().await.unwrap();
        assert_eq!(report.fetched, vec!["/", "assets/logo.png", "index.html"]);
        assert_eq!(net.call_count(), 3);
        assert_eq!(
            stored_paths(&m.ctx.namespaces, NamespaceKind::Content).await,
            vec!["/", "assets/logo.png", "index.html", "main.dart.js"]
        );
    }

    #[tokio::test]
    async fn test_nothing_missing_is_a_no_op() {
        let net = network();
        let m = materializer(net.clone());
        m.materialize().await.unwrap();

        let again = m.materialize().await.unwrap();
        assert!(again.fetched.is_empty());
        assert_eq!(net.call_count(), 4);
    }

    #[tokio::test]
    async fn test_single_failure_fails_the_batch() {
        let net = network();
        net.break_path("assets/logo.png");
        let m = materializer(net);

        assert!(m.materialize().await.is_err());
        assert!(stored_paths(&m.ctx.namespaces, NamespaceKind::Content).await.is_empty());
    }

    #[tokio::test]
    async fn test_bad_status_fails_the_batch() {
        let net = network();
        net.respond("index.html", Response::new(url("index.html"), 404, ""));
        let m = materializer(net);

        let err = m.materialize().await.unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
    }
}
