//! Test doubles shared by the worker's unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shellcache_core::{
    BuildManifest, CacheStorage, CoreShell, Error, Manifest, MemoryCache, NamespaceKind, NamespaceNames, Namespaces,
    Network, Origin, Request, Response,
};

use crate::WorkerContext;

pub const ORIGIN: &str = "https://shop.example";

pub fn origin() -> Origin {
    Origin::parse(ORIGIN).unwrap()
}

pub fn url(path: &str) -> String {
    origin().resolve(path)
}

pub fn build(resources: &[(&str, &str)], core: &[&str]) -> BuildManifest {
    let resources: Manifest = resources.iter().map(|(p, h)| (p.to_string(), h.to_string())).collect();
    BuildManifest::new(resources, CoreShell::new(core.iter().map(|p| p.to_string()).collect())).unwrap()
}

pub fn context(build: BuildManifest, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Arc<WorkerContext> {
    Arc::new(WorkerContext {
        manifest: Arc::new(build),
        origin: origin(),
        namespaces: Namespaces::new(storage, NamespaceNames::default()),
        network,
    })
}

/// Manifest paths currently stored in a namespace, sorted.
pub async fn stored_paths(namespaces: &Namespaces, kind: NamespaceKind) -> Vec<String> {
    let handle = namespaces.open(kind).await.unwrap();
    let mut paths: Vec<String> =
        handle.keys().await.unwrap().iter().map(|r| crate::keys::stored_path(&origin(), &r.url)).collect();
    paths.sort();
    paths
}

/// Scripted origin server.
///
/// Serves registered bodies by URL (ignoring the query string when there is
/// no exact match) and 404 for anything else.
#[derive(Default)]
pub struct FakeNetwork {
    routes: Mutex<HashMap<String, Response>>,
    failing: Mutex<HashSet<String>>,
    offline: AtomicBool,
    calls: Mutex<Vec<Request>>,
}

impl FakeNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn serving(paths: &[(&str, &str)]) -> Arc<Self> {
        let network = Self::new();
        for (path, body) in paths {
            network.serve(path, body);
        }
        network
    }

    pub fn serve(&self, path: &str, body: &str) {
        let target = url(path);
        let response = Response::new(&target, 200, body.to_string()).with_header("content-type", "text/plain");
        self.routes.lock().unwrap().insert(target, response);
    }

    pub fn respond(&self, path: &str, response: Response) {
        self.routes.lock().unwrap().insert(url(path), response);
    }

    /// Make one path fail at the transport level.
    pub fn break_path(&self, path: &str) {
        self.failing.lock().unwrap().insert(url(path));
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Request> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.lock().unwrap().push(request.clone());

        let bare = request.url.split('?').next().unwrap_or(&request.url).to_string();
        if self.offline.load(Ordering::SeqCst) || self.failing.lock().unwrap().contains(&bare) {
            return Err(Error::Network(format!("{}: connection refused", request.url)));
        }

        let routes = self.routes.lock().unwrap();
        Ok(routes
            .get(&request.url)
            .or_else(|| routes.get(&bare))
            .cloned()
            .unwrap_or_else(|| Response::new(&request.url, 404, "not found")))
    }
}

/// Storage that fails selected operations on top of a [`MemoryCache`].
#[derive(Default)]
pub struct FaultyStorage {
    inner: MemoryCache,
    fail_opens: AtomicBool,
    fail_removes: AtomicBool,
    fail_puts: Mutex<HashSet<String>>,
}

impl FaultyStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_opens(&self) {
        self.fail_opens.store(true, Ordering::SeqCst);
    }

    pub fn fail_removes(&self) {
        self.fail_removes.store(true, Ordering::SeqCst);
    }

    pub fn fail_puts_into(&self, namespace: &str) {
        self.fail_puts.lock().unwrap().insert(namespace.to_string());
    }

    pub fn heal(&self) {
        self.fail_opens.store(false, Ordering::SeqCst);
        self.fail_removes.store(false, Ordering::SeqCst);
        self.fail_puts.lock().unwrap().clear();
    }
}

#[async_trait]
impl CacheStorage for FaultyStorage {
    async fn open(&self, name: &str) -> Result<(), Error> {
        if self.fail_opens.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("{name}: disk full")));
        }
        self.inner.open(name).await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.inner.delete(name).await
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        self.inner.has(name).await
    }

    async fn names(&self) -> Result<Vec<String>, Error> {
        self.inner.names().await
    }

    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error> {
        if self.fail_puts.lock().unwrap().contains(name) {
            return Err(Error::Storage(format!("quota exceeded in {name}")));
        }
        self.inner.put(name, request, response).await
    }

    async fn lookup(&self, name: &str, request: &Request) -> Result<Option<Response>, Error> {
        self.inner.lookup(name, request).await
    }

    async fn keys(&self, name: &str) -> Result<Vec<Request>, Error> {
        self.inner.keys(name).await
    }

    async fn remove(&self, name: &str, request: &Request) -> Result<bool, Error> {
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("{name} is locked")));
        }
        self.inner.remove(name, request).await
    }
}
