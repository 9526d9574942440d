//! worker_message tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_worker::{ActivationOutcome, Dispatch, GenerationStatus, MaterializeReport, ServiceWorker, WorkerState};

use super::json_result;
use crate::error::ToolError;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageParams {
    /// Message payload: `skipWaiting` or `downloadOffline`.
    pub command: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageOutput {
    pub command: String,
    /// False when the payload matched no command and was ignored.
    pub recognized: bool,
    /// Set when skipWaiting promoted an installed generation.
    pub activation: Option<ActivationOutcome>,
    /// Set when downloadOffline ran.
    pub materialized: Option<MaterializeReport>,
    pub status: GenerationStatus,
}

pub async fn message_impl(worker: &ServiceWorker, params: WorkerMessageParams) -> Result<CallToolResult, McpError> {
    let mut output = WorkerMessageOutput {
        command: params.command.clone(),
        recognized: true,
        activation: None,
        materialized: None,
        status: worker.status(),
    };

    match worker.message(&params.command) {
        None => output.recognized = false,
        Some(Dispatch::SkipWaiting) => {
            if worker.status().state == WorkerState::Installed {
                output.activation = Some(worker.activate().await?);
            }
        }
        Some(Dispatch::Materializing(task)) => {
            let report = task.await.map_err(|e| ToolError::TaskFailed(e.to_string()))??;
            output.materialized = Some(report);
        }
    }

    output.status = worker.status();
    json_result(&output)
}
