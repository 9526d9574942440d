//! Client code for shellcache.
//!
//! This crate provides the HTTP transport the agent uses to reach the
//! origin. It implements the [`shellcache_core::Network`] seam.

pub mod fetch;

pub use fetch::{FetchConfig, HttpNetwork};
