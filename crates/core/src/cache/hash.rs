//! Request identity keys.

use sha2::{Digest, Sha256};

use crate::http::Request;

/// Compute the storage key for a request: method and URL, nothing else.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn request_key(request: &Request) -> String {
    compute_cache_key(request.method.as_str(), &request.url)
}
