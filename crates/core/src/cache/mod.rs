//! Named cache namespaces keyed by request identity.
//!
//! A namespace maps (method, URL) to a complete stored response. Two
//! backends implement [`CacheStorage`]:
//!
//! - [`CacheDb`]: SQLite with async access via tokio-rusqlite, durable
//!   across restarts
//! - [`MemoryCache`]: a locked in-process map for tests and ephemeral hosts
//!
//! [`Namespaces`] binds a backend to the three namespaces the agent uses.

pub mod connection;
pub mod entries;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod namespace;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use crate::Error;
use crate::http::{Request, Response};

pub use connection::CacheDb;
pub use memory::MemoryCache;
pub use namespace::{CacheHandle, NamespaceKind, NamespaceNames, Namespaces};

/// Storage backend for named cache namespaces.
///
/// Writes to a namespace that was never opened create it implicitly.
/// `keys` returns requests in first-insertion order; overwriting an entry
/// keeps its position.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the namespace if it does not exist.
    async fn open(&self, name: &str) -> Result<(), Error>;

    /// Drop the namespace and every entry in it. Returns false if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, Error>;

    async fn has(&self, name: &str) -> Result<bool, Error>;

    async fn names(&self) -> Result<Vec<String>, Error>;

    /// Store a response, replacing any entry with the same request identity.
    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error>;

    async fn lookup(&self, name: &str, request: &Request) -> Result<Option<Response>, Error>;

    async fn keys(&self, name: &str) -> Result<Vec<Request>, Error>;

    /// Remove one entry. Returns false if it was not stored.
    async fn remove(&self, name: &str, request: &Request) -> Result<bool, Error>;
}

/// Listing row for a stored entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EntrySummary {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body_len: usize,
}

impl EntrySummary {
    pub fn new(request: &Request, response: &Response) -> Self {
        Self {
            method: request.method.to_string(),
            url: request.url.clone(),
            status: response.status,
            content_type: response.content_type().map(str::to_string),
            body_len: response.body.len(),
        }
    }
}
