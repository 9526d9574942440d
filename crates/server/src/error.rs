//! Errors raised by the tool layer itself.
//!
//! Worker and cache failures arrive as `shellcache_core::Error` and carry
//! their own codes; these cover what only the host can get wrong.

use rmcp::model::{ErrorCode, ErrorData as McpError};

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// A background task panicked or was cancelled.
    #[error("TASK_FAILED: {0}")]
    TaskFailed(String),

    /// Tool output could not be encoded.
    #[error("SERIALIZE_FAILED: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let code = match &err {
            ToolError::TaskFailed(_) => -32010,
            ToolError::Serialize(_) => -32011,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_failed_code() {
        let err: McpError = ToolError::TaskFailed("cancelled".into()).into();
        assert_eq!(err.code, ErrorCode(-32010));
        assert!(err.message.contains("TASK_FAILED"));
    }
}
