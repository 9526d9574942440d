//! Mapping between URLs and manifest paths.
//!
//! Manifest paths are origin-relative without a leading slash, except the
//! application root which is `/`.

use shellcache_core::Origin;

/// Manifest path of a URL stored in a cache namespace.
///
/// Strips `<origin>/`; an empty remainder is the root `/`. URLs outside the
/// origin are returned unchanged and therefore never match a manifest path.
pub fn stored_path(origin: &Origin, url: &str) -> String {
    let Some(rest) = url.strip_prefix(origin.as_str()) else {
        return url.to_string();
    };
    let rest = match rest.strip_prefix('/') {
        Some(path) => path,
        None if rest.is_empty() => rest,
        None => return url.to_string(),
    };
    if rest.is_empty() { "/".to_string() } else { rest.to_string() }
}

/// Manifest path an intercepted request resolves to, if any.
///
/// - `<origin>`, `<origin>/` and `<origin>/#...` resolve to `/`
/// - a `?v=` version suffix is dropped
/// - any other query or fragment stays part of the key
pub fn request_key(origin: &Origin, url: &str) -> Option<String> {
    let rest = url.strip_prefix(origin.as_str())?;
    if rest.is_empty() || rest.starts_with("/#") {
        return Some("/".to_string());
    }

    let rest = rest.strip_prefix('/')?;
    let key = rest.split("?v=").next().unwrap_or(rest);
    if key.is_empty() { Some("/".to_string()) } else { Some(key.to_string()) }
}
