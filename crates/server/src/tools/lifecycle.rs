//! worker_install, worker_activate and worker_status tools.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_worker::{ActivationOutcome, GenerationStatus, InstallReport, ServiceWorker};

use super::json_result;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstallOutput {
    pub report: InstallReport,
    pub status: GenerationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ActivateOutput {
    pub outcome: ActivationOutcome,
    pub status: GenerationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatusOutput {
    pub origin: String,
    pub status: GenerationStatus,
    /// Number of resources in the build manifest.
    pub resources: usize,
    /// Number of core shell paths staged on install.
    pub core: usize,
    pub namespaces: NamespaceNamesOutput,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NamespaceNamesOutput {
    pub staging: String,
    pub content: String,
    pub metadata: String,
}

pub async fn install_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let report = worker.install().await?;
    json_result(&InstallOutput { report, status: worker.status() })
}

pub async fn activate_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let outcome = worker.activate().await?;
    json_result(&ActivateOutput { outcome, status: worker.status() })
}

pub async fn status_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let ctx = worker.context();
    let names = ctx.namespaces.names();

    json_result(&StatusOutput {
        origin: ctx.origin.to_string(),
        status: worker.status(),
        resources: ctx.manifest.resources.len(),
        core: ctx.manifest.core.len(),
        namespaces: NamespaceNamesOutput {
            staging: names.staging.clone(),
            content: names.content.clone(),
            metadata: names.metadata.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{json, worker};

    #[tokio::test]
    async fn test_install_then_activate() {
        let (sw, _) = worker();

        let installed = json(&install_impl(&sw).await.unwrap());
        assert_eq!(installed["status"]["state"], "installed");
        assert_eq!(installed["report"]["staged"].as_array().unwrap().len(), 2);

        let activated = json(&activate_impl(&sw).await.unwrap());
        assert_eq!(activated["outcome"]["outcome"], "migrated");
        assert_eq!(activated["outcome"]["first_install"], true);
        assert_eq!(activated["status"]["state"], "activated");
    }

    #[tokio::test]
    async fn test_activate_before_install_is_rejected() {
        let (sw, _) = worker();
        let err = activate_impl(&sw).await.unwrap_err();
        assert_eq!(err.code.0, -32007);
    }

    #[tokio::test]
    async fn test_status_reports_namespaces() {
        let (sw, _) = worker();
        let status = json(&status_impl(&sw).await.unwrap());

        assert_eq!(status["origin"], "https://shop.example");
        assert_eq!(status["status"]["state"], "parsed");
        assert_eq!(status["resources"], 3);
        assert_eq!(status["namespaces"]["content"], "app-cache");
    }
}
