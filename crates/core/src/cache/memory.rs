//! In-memory implementation of [`CacheStorage`].
//!
//! Uses a HashMap of namespaces behind a tokio RwLock. Nothing survives the
//! process; hosts that need durability use [`super::CacheDb`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::CacheStorage;
use super::hash::request_key;
use crate::Error;
use crate::http::{Request, Response};

/// Entries of one namespace in first-insertion order.
#[derive(Debug, Default)]
struct Namespace {
    order: Vec<String>,
    entries: HashMap<String, (Request, Response)>,
}

#[derive(Debug, Default, Clone)]
pub struct MemoryCache {
    namespaces: Arc<RwLock<HashMap<String, Namespace>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCache {
    async fn open(&self, name: &str) -> Result<(), Error> {
        self.namespaces.write().await.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        Ok(self.namespaces.write().await.remove(name).is_some())
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        Ok(self.namespaces.read().await.contains_key(name))
    }

    async fn names(&self) -> Result<Vec<String>, Error> {
        let mut names: Vec<String> = self.namespaces.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let key = request_key(request);
        let mut namespaces = self.namespaces.write().await;
        let ns = namespaces.entry(name.to_string()).or_default();

        let stored = Request::new(request.method, request.url.clone());
        if ns.entries.insert(key.clone(), (stored, response.clone())).is_none() {
            ns.order.push(key);
        }
        Ok(())
    }

    async fn lookup(&self, name: &str, request: &Request) -> Result<Option<Response>, Error> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces
            .get(name)
            .and_then(|ns| ns.entries.get(&request_key(request)))
            .map(|(_, response)| response.clone()))
    }

    async fn keys(&self, name: &str) -> Result<Vec<Request>, Error> {
        let namespaces = self.namespaces.read().await;
        let Some(ns) = namespaces.get(name) else {
            return Ok(Vec::new());
        };
        Ok(ns
            .order
            .iter()
            .filter_map(|key| ns.entries.get(key))
            .map(|(request, _)| request.clone())
            .collect())
    }

    async fn remove(&self, name: &str, request: &Request) -> Result<bool, Error> {
        let key = request_key(request);
        let mut namespaces = self.namespaces.write().await;
        let Some(ns) = namespaces.get_mut(name) else {
            return Ok(false);
        };
        if ns.entries.remove(&key).is_none() {
            return Ok(false);
        }
        ns.order.retain(|k| k != &key);
        Ok(true)
    }
}
