//! Core types and shared functionality for shellcache.
//!
//! This crate provides:
//! - Cache namespaces with SQLite and in-memory backends
//! - The build manifest and its comparison logic
//! - Request/response model and the network seam
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod manifest;
pub mod origin;

pub use cache::{CacheDb, CacheHandle, CacheStorage, MemoryCache, NamespaceKind, NamespaceNames, Namespaces};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use http::{CacheMode, Method, Network, Request, Response};
pub use manifest::{BuildManifest, CoreShell, Manifest, ManifestDiff};
pub use origin::Origin;
