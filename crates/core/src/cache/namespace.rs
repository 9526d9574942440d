//! The three namespaces the agent works with.
//!
//! Staging holds core shell responses fetched during install, Content is the
//! only namespace consulted for intercepted requests, and Metadata holds the
//! single persisted manifest record.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::{CacheStorage, EntrySummary};
use crate::Error;
use crate::http::{Request, Response};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamespaceKind {
    Staging,
    Content,
    Metadata,
}

impl NamespaceKind {
    pub const ALL: [NamespaceKind; 3] = [NamespaceKind::Content, NamespaceKind::Staging, NamespaceKind::Metadata];
}

impl fmt::Display for NamespaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NamespaceKind::Staging => "staging",
            NamespaceKind::Content => "content",
            NamespaceKind::Metadata => "metadata",
        })
    }
}

impl FromStr for NamespaceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staging" => Ok(NamespaceKind::Staging),
            "content" => Ok(NamespaceKind::Content),
            "metadata" => Ok(NamespaceKind::Metadata),
            other => Err(Error::InvalidInput(format!("unknown namespace: {other}"))),
        }
    }
}

/// Storage names of the three namespaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceNames {
    pub staging: String,
    pub content: String,
    pub metadata: String,
}

impl NamespaceNames {
    /// `<prefix>-temp-cache`, `<prefix>-cache` and `<prefix>-manifest`.
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            staging: format!("{prefix}-temp-cache"),
            content: format!("{prefix}-cache"),
            metadata: format!("{prefix}-manifest"),
        }
    }

    pub fn name(&self, kind: NamespaceKind) -> &str {
        match kind {
            NamespaceKind::Staging => &self.staging,
            NamespaceKind::Content => &self.content,
            NamespaceKind::Metadata => &self.metadata,
        }
    }
}

impl Default for NamespaceNames {
    fn default() -> Self {
        Self::with_prefix("app")
    }
}

/// Owns the storage backend and the namespace names.
#[derive(Clone)]
pub struct Namespaces {
    storage: Arc<dyn CacheStorage>,
    names: NamespaceNames,
}

impl Namespaces {
    pub fn new(storage: Arc<dyn CacheStorage>, names: NamespaceNames) -> Self {
        Self { storage, names }
    }

    pub fn names(&self) -> &NamespaceNames {
        &self.names
    }

    pub async fn open(&self, kind: NamespaceKind) -> Result<CacheHandle, Error> {
        let name = self.names.name(kind).to_string();
        self.storage.open(&name).await?;
        Ok(CacheHandle { storage: Arc::clone(&self.storage), name })
    }

    pub async fn delete(&self, kind: NamespaceKind) -> Result<bool, Error> {
        self.storage.delete(self.names.name(kind)).await
    }

    pub async fn exists(&self, kind: NamespaceKind) -> Result<bool, Error> {
        self.storage.has(self.names.name(kind)).await
    }

    /// Delete all three namespaces.
    ///
    /// Every delete is attempted; the first error is returned afterwards.
    pub async fn wipe_all(&self) -> Result<(), Error> {
        let mut first_err = None;
        for kind in NamespaceKind::ALL {
            if let Err(e) = self.delete(kind).await {
                tracing::error!(namespace = %kind, error = %e, "failed to delete namespace");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Entries currently stored in a namespace, without opening it.
    pub async fn summary(&self, kind: NamespaceKind) -> Result<Vec<EntrySummary>, Error> {
        let name = self.names.name(kind);
        let mut rows = Vec::new();
        for request in self.storage.keys(name).await? {
            if let Some(response) = self.storage.lookup(name, &request).await? {
                rows.push(EntrySummary::new(&request, &response));
            }
        }
        Ok(rows)
    }
}

/// An opened namespace.
#[derive(Clone)]
pub struct CacheHandle {
    storage: Arc<dyn CacheStorage>,
    name: String,
}

impl CacheHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        self.storage.put(&self.name, request, response).await
    }

    pub async fn lookup(&self, request: &Request) -> Result<Option<Response>, Error> {
        self.storage.lookup(&self.name, request).await
    }

    pub async fn keys(&self) -> Result<Vec<Request>, Error> {
        self.storage.keys(&self.name).await
    }

    pub async fn remove(&self, request: &Request) -> Result<bool, Error> {
        self.storage.remove(&self.name, request).await
    }
}

impl fmt::Debug for CacheHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheHandle").field("name", &self.name).finish()
    }
}
