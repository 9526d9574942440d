//! The single origin the agent serves.
//!
//! All cache keys and manifest paths are relative to this origin. It is
//! parsed once from configuration and handed to every component.

use std::fmt;

use crate::Error;

/// Scheme, host and port of the hosted application, without a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin(String);

impl Origin {
    /// Parse an origin string.
    ///
    /// Normalization steps:
    /// 1. Trim leading/trailing whitespace
    /// 2. Require an `http` or `https` scheme
    /// 3. Lowercase the host, drop the default port
    /// 4. Reject paths other than `/`, queries and fragments
    pub fn parse(input: &str) -> Result<Self, Error> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidOrigin("empty origin".into()));
        }

        let parsed = url::Url::parse(trimmed).map_err(|e| Error::InvalidOrigin(format!("{trimmed}: {e}")))?;

        match parsed.scheme() {
            "http" | "https" => {}
            scheme => return Err(Error::InvalidOrigin(format!("unsupported scheme: {scheme}"))),
        }

        if parsed.path() != "/" || parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(Error::InvalidOrigin(format!("{trimmed}: origin must not carry a path, query or fragment")));
        }

        Ok(Self(parsed.origin().ascii_serialization()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absolute URL for a manifest path. The root path `/` maps to `<origin>/`.
    pub fn resolve(&self, path: &str) -> String {
        if path == "/" { format!("{}/", self.0) } else { format!("{}/{}", self.0, path.trim_start_matches('/')) }
    }

    /// Turn a caller-supplied URL or origin-relative path into an absolute URL.
    pub fn absolutize(&self, raw: &str) -> Result<String, Error> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("empty URL".into()));
        }

        let candidate = if trimmed.contains("://") { trimmed.to_string() } else { self.resolve(trimmed) };
        let parsed = url::Url::parse(&candidate).map_err(|e| Error::InvalidInput(format!("{candidate}: {e}")))?;

        Ok(parsed.to_string())
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
