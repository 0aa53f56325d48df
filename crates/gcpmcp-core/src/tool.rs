//! Tool abstractions
//!
//! A tool is a named operation with a JSON-schema parameter description.
//! Tools receive their arguments as a JSON object and return a JSON value.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::{GcpError, GcpResult};

/// Where a tool implementation comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolType {
    /// Shipped with the server
    Builtin,
    /// Registered by an embedding application
    Custom,
}

/// Static configuration of a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    pub name: String,
    pub description: String,

    /// JSON schema for the arguments object
    pub parameters: serde_json::Value,

    pub tool_type: ToolType,

    /// Upper bound for each upstream call made by the tool
    pub timeout_secs: u64,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Tool description as advertised to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Arguments for a single tool invocation
#[derive(Debug, Clone)]
pub struct ToolInput {
    pub arguments: serde_json::Value,

    /// Cancelled when the caller abandons the invocation
    pub cancellation: CancellationToken,
}

impl ToolInput {
    pub fn new(arguments: serde_json::Value) -> Self {
        Self {
            arguments,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Deserialize a required argument. Missing and `null` arguments are errors.
    pub fn get_arg<T: DeserializeOwned>(&self, name: &str) -> GcpResult<T> {
        self.get_optional_arg(name)?
            .ok_or_else(|| GcpError::tool(format!("Missing required argument: {}", name)))
    }

    /// Deserialize an optional argument. `None` only when it is missing or
    /// `null`; a value of the wrong type or out of range is an error.
    pub fn get_optional_arg<T: DeserializeOwned>(&self, name: &str) -> GcpResult<Option<T>> {
        match self.arguments.get(name) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|e| {
                GcpError::tool(format!("Invalid value for argument '{}': {}", name, e))
            }),
        }
    }
}

/// Outcome of a tool invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub data: serde_json::Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

impl ToolResult {
    pub fn success(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data,
            error: None,
            execution_time_ms: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: serde_json::Value::Null,
            error: Some(message.into()),
            execution_time_ms: None,
        }
    }

    pub fn with_execution_time(mut self, elapsed_ms: u64) -> Self {
        self.execution_time_ms = Some(elapsed_ms);
        self
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    async fn execute(&self, input: ToolInput) -> GcpResult<ToolResult>;

    fn config(&self) -> &ToolConfig;

    fn definition(&self) -> ToolDefinition {
        let config = self.config();
        ToolDefinition {
            name: config.name.clone(),
            description: config.description.clone(),
            parameters: config.parameters.clone(),
        }
    }
}

/// Dispatches invocations to tools by name
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute_tool(&self, name: &str, input: ToolInput) -> GcpResult<ToolResult>;

    fn list_tools(&self) -> Vec<ToolDefinition>;

    fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_arg_typed() {
        let input = ToolInput::new(json!({"functionName": "process-image", "limit": 5}));

        let name: String = input.get_arg("functionName").unwrap();
        let limit: usize = input.get_arg("limit").unwrap();
        assert_eq!(name, "process-image");
        assert_eq!(limit, 5);
    }

    #[test]
    fn test_get_arg_missing_and_null() {
        let input = ToolInput::new(json!({"limit": null}));

        assert!(input.get_arg::<usize>("limit").is_err());
        assert!(input.get_arg::<String>("functionName").is_err());
        assert_eq!(input.get_optional_arg::<usize>("limit").unwrap(), None);
        assert_eq!(input.get_optional_arg::<String>("region").unwrap(), None);
    }

    #[test]
    fn test_get_optional_arg_rejects_bad_values() {
        let input = ToolInput::new(json!({"limit": "ten", "hours": -5, "region": 7}));

        let err = input.get_optional_arg::<usize>("limit").unwrap_err();
        assert!(err.to_string().contains("Invalid value for argument 'limit'"));
        assert!(input.get_optional_arg::<u32>("hours").is_err());
        assert!(input.get_optional_arg::<String>("region").is_err());

        let input = ToolInput::new(json!({"limit": 5}));
        assert_eq!(input.get_optional_arg::<usize>("limit").unwrap(), Some(5));
    }

    #[test]
    fn test_get_arg_wrong_type() {
        let input = ToolInput::new(json!({"limit": "ten"}));
        let err = input.get_arg::<usize>("limit").unwrap_err();
        assert!(err.to_string().contains("Invalid value for argument 'limit'"));
    }

    #[test]
    fn test_tool_result_builders() {
        let ok = ToolResult::success(json!({"n": 1})).with_execution_time(12);
        assert!(ok.success);
        assert_eq!(ok.execution_time_ms, Some(12));

        let failed = ToolResult::error("boom");
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("boom"));
    }
}
