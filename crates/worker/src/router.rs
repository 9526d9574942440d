//! Per-request routing for intercepted fetches.
//!
//! Only GET requests for manifest resources are intercepted. The root
//! document is served network-first; everything else cache-first with a
//! lazy fill of successful responses.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{CacheHandle, Error, Method, NamespaceKind, Request, Response};

use crate::WorkerContext;
use crate::keys::request_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    NetworkFirst,
    CacheFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Network,
    Cache,
}

/// A response produced by the router.
#[derive(Debug, Clone)]
pub struct Routed {
    /// Manifest path the request resolved to.
    pub key: String,
    pub strategy: Strategy,
    pub source: Source,
    pub response: Response,
}

#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Not intercepted; the request goes to the network untouched.
    Passthrough,
    Respond(Routed),
}

#[derive(Clone)]
pub struct FetchRouter {
    ctx: Arc<WorkerContext>,
}

impl FetchRouter {
    pub fn new(ctx: Arc<WorkerContext>) -> Self {
        Self { ctx }
    }

    pub async fn route(&self, request: &Request) -> Result<FetchOutcome, Error> {
        if request.method != Method::Get {
            return Ok(FetchOutcome::Passthrough);
        }

        let Some(key) = request_key(&self.ctx.origin, &request.url) else {
            return Ok(FetchOutcome::Passthrough);
        };
        if !self.ctx.manifest.resources.contains(&key) {
            tracing::debug!(url = %request.url, "not a manifest resource, passing through");
            return Ok(FetchOutcome::Passthrough);
        }

        // One entry per manifest path, whatever query or fragment was used.
        let cache_key = Request::get(self.ctx.origin.resolve(&key));

        let routed = if key == "/" {
            self.network_first(key, request, &cache_key).await?
        } else {
            self.cache_first(key, request, &cache_key).await?
        };

        tracing::debug!(url = %request.url, key = %routed.key, source = ?routed.source, "routed");
        Ok(FetchOutcome::Respond(routed))
    }

    /// Live response first, stored as a fallback; the cached copy only when offline.
    async fn network_first(&self, key: String, request: &Request, cache_key: &Request) -> Result<Routed, Error> {
        match self.ctx.network.fetch(request).await {
            Ok(response) => {
                self.store_copy(cache_key, &response).await;
                Ok(Routed { key, strategy: Strategy::NetworkFirst, source: Source::Network, response })
            }
            Err(err) => match self.cached(cache_key).await {
                Some(response) => {
                    tracing::info!(url = %request.url, error = %err, "network failed, serving cached root");
                    Ok(Routed { key, strategy: Strategy::NetworkFirst, source: Source::Cache, response })
                }
                None => Err(err),
            },
        }
    }

    async fn cache_first(&self, key: String, request: &Request, cache_key: &Request) -> Result<Routed, Error> {
        if let Some(response) = self.cached(cache_key).await {
            return Ok(Routed { key, strategy: Strategy::CacheFirst, source: Source::Cache, response });
        }

        let response = self.ctx.network.fetch(request).await?;
        if response.ok() {
            self.store_copy(cache_key, &response).await;
        }
        Ok(Routed { key, strategy: Strategy::CacheFirst, source: Source::Network, response })
    }

    async fn content(&self) -> Result<CacheHandle, Error> {
        self.ctx.namespaces.open(NamespaceKind::Content).await
    }

    /// Content lookup. An unreadable cache counts as a miss.
    async fn cached(&self, cache_key: &Request) -> Option<Response> {
        let lookup = match self.content().await {
            Ok(content) => content.lookup(cache_key).await,
            Err(e) => Err(e),
        };
        lookup.unwrap_or_else(|e| {
            tracing::warn!(url = %cache_key.url, error = %e, "cache lookup failed, treating as miss");
            None
        })
    }

    /// A failed write leaves the cache cold but must not fail the response.
    async fn store_copy(&self, cache_key: &Request, response: &Response) {
        let stored = match self.content().await {
            Ok(content) => content.put(cache_key, response).await,
            Err(e) => Err(e),
        };
        if let Err(e) = stored {
            tracing::warn!(url = %cache_key.url, error = %e, "failed to cache response");
        }
    }
}
