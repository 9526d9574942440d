//! Install and activate phases of a worker generation.
//!
//! Install stages the core shell. Activate migrates staging into content,
//! evicting every cached resource whose hash changed since the previously
//! persisted manifest, then persists the new manifest.
//!
//! Activation is not serialized against fetch routing: a request routed
//! while eviction is running can read or lazily refill Content mid-migration.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{CacheHandle, CacheMode, Error, Manifest, ManifestDiff, NamespaceKind, Request, Response};

use crate::WorkerContext;
use crate::generation::WorkerControl;
use crate::keys::stored_path;

/// Path of the sentinel request that keys the persisted manifest record.
pub const MANIFEST_RECORD_KEY: &str = "manifest";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InstallReport {
    pub staged: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MigrationReport {
    /// No manifest record existed, so Content was rebuilt from staging alone.
    pub first_install: bool,
    pub evicted: Vec<String>,
    pub retained: Vec<String>,
    pub staged: Vec<String>,
    /// Comparison against the previous record, when there was one.
    pub diff: Option<ManifestDiff>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActivationOutcome {
    Migrated(MigrationReport),
    /// Migration failed and every namespace was deleted.
    RolledBack { reason: String },
}

#[derive(Clone)]
pub struct Lifecycle {
    ctx: Arc<WorkerContext>,
    control: Arc<dyn WorkerControl>,
}

impl Lifecycle {
    pub fn new(ctx: Arc<WorkerContext>, control: Arc<dyn WorkerControl>) -> Self {
        Self { ctx, control }
    }

    /// Fetch every core shell resource, bypassing HTTP caches, into Staging.
    ///
    /// The first failing resource aborts the install. Entries staged before
    /// it stay in Staging until the next activation or wipe.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.control.skip_waiting();

        let staging = self.ctx.namespaces.open(NamespaceKind::Staging).await?;
        let mut report = InstallReport::default();

        for path in self.ctx.manifest.core.paths() {
            let request = Request::get(self.ctx.origin.resolve(path)).with_cache_mode(CacheMode::Reload);
            let response = self
                .ctx
                .network
                .fetch(&request)
                .await
                .map_err(|e| Error::InstallFailed { path: path.to_string(), reason: e.to_string() })?;

            if !response.ok() {
                return Err(Error::InstallFailed {
                    path: path.to_string(),
                    reason: format!("status {}", response.status),
                });
            }

            staging.put(&request, &response).await?;
            report.staged.push(path.to_string());
        }

        tracing::info!(staged = report.staged.len(), "core shell staged");
        Ok(report)
    }

    /// Migrate staging into content and persist the new manifest.
    ///
    /// Never fails: any error wipes Content, Staging and Metadata and is
    /// reported as [`ActivationOutcome::RolledBack`].
    pub async fn activate(&self) -> ActivationOutcome {
        match self.migrate().await {
            Ok(report) => {
                tracing::info!(
                    first_install = report.first_install,
                    evicted = report.evicted.len(),
                    retained = report.retained.len(),
                    staged = report.staged.len(),
                    "activation complete"
                );
                ActivationOutcome::Migrated(report)
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to upgrade asset cache, wiping namespaces");
                if let Err(wipe_err) = self.ctx.namespaces.wipe_all().await {
                    tracing::error!(error = %wipe_err, "wipe after failed activation incomplete");
                }
                ActivationOutcome::RolledBack { reason: err.to_string() }
            }
        }
    }

    async fn migrate(&self) -> Result<MigrationReport, Error> {
        let namespaces = &self.ctx.namespaces;
        let mut content = namespaces.open(NamespaceKind::Content).await?;
        let staging = namespaces.open(NamespaceKind::Staging).await?;
        let metadata = namespaces.open(NamespaceKind::Metadata).await?;

        let record_request = self.record_request();
        let mut report = MigrationReport::default();

        match metadata.lookup(&record_request).await? {
            None => {
                namespaces.delete(NamespaceKind::Content).await?;
                content = namespaces.open(NamespaceKind::Content).await?;
                report.first_install = true;
            }
            Some(record) => {
                let previous = Manifest::from_json(&record.body)?;
                self.evict_stale(&content, &previous, &mut report).await?;
                report.diff = Some(self.ctx.manifest.resources.diff(&previous));
            }
        }

        // Staging entries win over anything that survived eviction.
        for request in staging.keys().await? {
            if let Some(response) = staging.lookup(&request).await? {
                content.put(&request, &response).await?;
                report.staged.push(stored_path(&self.ctx.origin, &request.url));
            }
        }

        namespaces.delete(NamespaceKind::Staging).await?;

        let body = self.ctx.manifest.resources.to_json()?;
        metadata.put(&record_request, &Response::json(&record_request.url, body)).await?;

        self.control.claim_clients();
        Ok(report)
    }

    async fn evict_stale(
        &self, content: &CacheHandle, previous: &Manifest, report: &mut MigrationReport,
    ) -> Result<(), Error> {
        let current = &self.ctx.manifest.resources;
        for request in content.keys().await? {
            let path = stored_path(&self.ctx.origin, &request.url);
            if current.is_unchanged(previous, &path) {
                report.retained.push(path);
            } else {
                content.remove(&request).await?;
                tracing::debug!(path = %path, "evicted stale resource");
                report.evicted.push(path);
            }
        }
        Ok(())
    }

    fn record_request(&self) -> Request {
        Request::get(self.ctx.origin.resolve(MANIFEST_RECORD_KEY))
    }

    /// The manifest persisted by the last successful activation, if any.
    pub async fn persisted_manifest(&self) -> Result<Option<Manifest>, Error> {
        let metadata = self.ctx.namespaces.open(NamespaceKind::Metadata).await?;
        match metadata.lookup(&self.record_request()).await? {
            Some(record) => Ok(Some(Manifest::from_json(&record.body)?)),
            None => Ok(None),
        }
    }
}
