//! Build manifest: resource path → content hash, plus the core shell.
//!
//! A manifest describes one build's complete resource set. The lifecycle
//! controller persists it after each activation and compares the next
//! build against it to decide which cached responses survive an upgrade.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Map of resource path to content hash for one build.
///
/// Serializes as a flat JSON object, which is also the body of the
/// persisted manifest record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, String>,
}

impl Manifest {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True iff `path` is present in both manifests with the same hash.
    pub fn is_unchanged(&self, previous: &Manifest, path: &str) -> bool {
        match (self.get(path), previous.get(path)) {
            (Some(current), Some(old)) => current == old,
            _ => false,
        }
    }

    /// Classify every path of both manifests relative to `previous`.
    pub fn diff(&self, previous: &Manifest) -> ManifestDiff {
        let mut diff = ManifestDiff::default();

        for (path, hash) in &self.entries {
            match previous.get(path) {
                None => diff.added.insert(path.clone()),
                Some(old) if old == hash => diff.unchanged.insert(path.clone()),
                Some(_) => diff.changed.insert(path.clone()),
            };
        }

        diff.removed = previous.paths().filter(|p| !self.contains(p)).map(str::to_string).collect();

        diff
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, Error> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl FromIterator<(String, String)> for Manifest {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

/// Result of comparing two manifests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ManifestDiff {
    pub added: BTreeSet<String>,
    pub changed: BTreeSet<String>,
    pub removed: BTreeSet<String>,
    pub unchanged: BTreeSet<String>,
}

/// The resources needed before the application can boot offline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoreShell {
    paths: Vec<String>,
}

impl CoreShell {
    pub fn new(paths: Vec<String>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// A build's manifest together with its core shell.
///
/// On disk this is `{"resources": {path: hash}, "core": [path, ...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildManifest {
    pub resources: Manifest,
    pub core: CoreShell,
}

impl BuildManifest {
    /// Build and validate that every core path is a manifest resource.
    pub fn new(resources: Manifest, core: CoreShell) -> Result<Self, Error> {
        let build = Self { resources, core };
        build.validate()?;
        Ok(build)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, Error> {
        let build: Self =
            serde_json::from_slice(bytes).map_err(|e| Error::InvalidManifest(format!("malformed manifest: {e}")))?;
        build.validate()?;
        Ok(build)
    }

    /// Load a build manifest file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Error::InvalidManifest(format!("failed to read {}: {e}", path.display())))?;
        Self::from_json(&bytes)
    }

    fn validate(&self) -> Result<(), Error> {
        if let Some(missing) = self.core.paths().find(|p| !self.resources.contains(p)) {
            return Err(Error::InvalidManifest(format!("core path {missing} is not a manifest resource")));
        }
        Ok(())
    }
}
