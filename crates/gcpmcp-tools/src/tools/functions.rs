//! Cloud Functions Tools
//!
//! Tools for inspecting and exercising Google Cloud Functions.
//!
//! ## Available Tools
//!
//! - `list-cloud-functions` - List functions in the configured project/region
//! - `get-cloud-function-details` - Normalized metadata for one function
//! - `get-cloud-function-source` - Where the function's source code lives
//! - `get-cloud-function-logs` - Recent log entries, newest first
//! - `get-cloud-function-errors` - Recent ERROR+ entries with stack traces
//! - `test-http-function` - POST a JSON payload to an HTTP-triggered function
//! - `get-cloud-function-metrics` - Log-derived execution and error counts
//!
//! ## Prerequisites
//!
//! - Application default credentials with `cloudfunctions.functions.get`,
//!   `cloudfunctions.functions.list` and `logging.logEntries.list`
//! - `cloudfunctions.functions.sourceCodeGet` for source download URLs

use async_trait::async_trait;
use gcpmcp_core::{GcpError, GcpResult, Tool, ToolConfig, ToolDefinition, ToolInput, ToolResult};
use std::time::Duration;
use tracing::debug;

use super::common::{create_schema, tool_config_with_timeout};
use crate::functions::{CallContext, FunctionsAdapter};

const DEFAULT_LOG_LIMIT: usize = 50;
const DEFAULT_ERROR_LIMIT: usize = 10;
const DEFAULT_METRICS_HOURS: u32 = 24;

/// Collection of all Cloud Functions tools
pub struct FunctionsTools;

impl FunctionsTools {
    /// Get all Cloud Functions tools bound to `adapter`
    pub fn all(adapter: &FunctionsAdapter) -> Vec<Box<dyn Tool>> {
        vec![
            Box::new(ListFunctionsTool::new(adapter.clone())),
            Box::new(FunctionDetailsTool::new(adapter.clone())),
            Box::new(FunctionSourceTool::new(adapter.clone())),
            Box::new(FunctionLogsTool::new(adapter.clone())),
            Box::new(FunctionErrorsTool::new(adapter.clone())),
            Box::new(TestHttpFunctionTool::new(adapter.clone())),
            Box::new(FunctionMetricsTool::new(adapter.clone())),
        ]
    }

    /// Tool definitions, available without credentials or a project
    pub fn definitions(timeout_secs: u64) -> Vec<ToolDefinition> {
        [
            ListFunctionsTool::tool_config(timeout_secs),
            FunctionDetailsTool::tool_config(timeout_secs),
            FunctionSourceTool::tool_config(timeout_secs),
            FunctionLogsTool::tool_config(timeout_secs),
            FunctionErrorsTool::tool_config(timeout_secs),
            TestHttpFunctionTool::tool_config(timeout_secs),
            FunctionMetricsTool::tool_config(timeout_secs),
        ]
        .into_iter()
        .map(|config| ToolDefinition {
            name: config.name,
            description: config.description,
            parameters: config.parameters,
        })
        .collect()
    }
}

fn function_name_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": "Function name (short name, not the full resource path)"
    })
}

/// The adapter's deadline, bound to the caller's cancellation token
fn call_context(adapter: &FunctionsAdapter, input: &ToolInput) -> CallContext {
    adapter
        .call_context()
        .with_cancellation(input.cancellation.clone())
}

fn timeout_secs(adapter: &FunctionsAdapter) -> u64 {
    adapter.config().timeout.as_secs().max(1)
}

// ============================================================================
// List Functions Tool
// ============================================================================

/// List functions in a region
pub struct ListFunctionsTool {
    adapter: FunctionsAdapter,
    config: ToolConfig,
}

impl ListFunctionsTool {
    pub fn new(adapter: FunctionsAdapter) -> Self {
        let config = Self::tool_config(timeout_secs(&adapter));
        Self { adapter, config }
    }

    fn tool_config(timeout_secs: u64) -> ToolConfig {
        let parameters = create_schema(
            serde_json::json!({
                "region": {
                    "type": "string",
                    "description": "Region to list (defaults to the configured region)"
                }
            }),
            vec![],
        );

        tool_config_with_timeout(
            "list-cloud-functions",
            "List Cloud Functions in the active project with status, runtime, trigger and URL.",
            parameters,
            timeout_secs,
        )
    }
}

#[async_trait]
impl Tool for ListFunctionsTool {
    async fn execute(&self, input: ToolInput) -> GcpResult<ToolResult> {
        let region: Option<String> = input.get_optional_arg("region")?;
        let ctx = call_context(&self.adapter, &input);

        let functions = match region {
            Some(region) => {
                debug!(region = %region, "Listing functions in requested region");
                self.adapter.in_region(region).list_functions(&ctx).await?
            }
            None => self.adapter.list_functions(&ctx).await?,
        };

        Ok(ToolResult::success(serde_json::to_value(functions)?))
    }

    fn config(&self) -> &ToolConfig {
        &self.config
    }
}

// ============================================================================
// Function Details Tool
// ============================================================================

/// Normalized metadata for one function
pub struct FunctionDetailsTool {
    adapter: FunctionsAdapter,
    config: ToolConfig,
}

impl FunctionDetailsTool {
    pub fn new(adapter: FunctionsAdapter) -> Self {
        let config = Self::tool_config(timeout_secs(&adapter));
        Self { adapter, config }
    }

    fn tool_config(timeout_secs: u64) -> ToolConfig {
        let parameters = create_schema(
            serde_json::json!({ "functionName": function_name_schema() }),
            vec!["functionName"],
        );

        tool_config_with_timeout(
            "get-cloud-function-details",
            "Get details of a Cloud Function: status, runtime, entry point, memory, timeout, environment and trigger.",
            parameters,
            timeout_secs,
        )
    }
}

#[async_trait]
impl Tool for FunctionDetailsTool {
    async fn execute(&self, input: ToolInput) -> GcpResult<ToolResult> {
        let name: String = input.get_arg("functionName")?;
        let ctx = call_context(&self.adapter, &input);

        let details = self.adapter.get_function_details(&ctx, &name).await?;
        Ok(ToolResult::success(serde_json::to_value(details)?))
    }

    fn config(&self) -> &ToolConfig {
        &self.config
    }
}

// ============================================================================
// Function Source Tool
// ============================================================================

/// Resolve the source location of a function
pub struct FunctionSourceTool {
    adapter: FunctionsAdapter,
    config: ToolConfig,
}

impl FunctionSourceTool {
    pub fn new(adapter: FunctionsAdapter) -> Self {
        let config = Self::tool_config(timeout_secs(&adapter));
        Self { adapter, config }
    }

    fn tool_config(timeout_secs: u64) -> ToolConfig {
        let parameters = create_schema(
            serde_json::json!({ "functionName": function_name_schema() }),
            vec!["functionName"],
        );

        tool_config_with_timeout(
            "get-cloud-function-source",
            "Find a Cloud Function's source: repository, storage archive, or a generated download URL.",
            parameters,
            timeout_secs,
        )
    }
}

#[async_trait]
impl Tool for FunctionSourceTool {
    async fn execute(&self, input: ToolInput) -> GcpResult<ToolResult> {
        let name: String = input.get_arg("functionName")?;
        let ctx = call_context(&self.adapter, &input);

        let source = self.adapter.get_function_source(&ctx, &name).await?;
        Ok(ToolResult::success(serde_json::to_value(source)?))
    }

    fn config(&self) -> &ToolConfig {
        &self.config
    }
}

// ============================================================================
// Function Logs Tool
// ============================================================================

/// Recent log entries for a function
pub struct FunctionLogsTool {
    adapter: FunctionsAdapter,
    config: ToolConfig,
}

impl FunctionLogsTool {
    pub fn new(adapter: FunctionsAdapter) -> Self {
        let config = Self::tool_config(timeout_secs(&adapter));
        Self { adapter, config }
    }

    fn tool_config(timeout_secs: u64) -> ToolConfig {
        let parameters = create_schema(
            serde_json::json!({
                "functionName": function_name_schema(),
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of entries to return",
                    "minimum": 0,
                    "default": DEFAULT_LOG_LIMIT
                }
            }),
            vec!["functionName"],
        );

        tool_config_with_timeout(
            "get-cloud-function-logs",
            "Get the most recent log entries of a Cloud Function, newest first.",
            parameters,
            timeout_secs,
        )
    }
}

#[async_trait]
impl Tool for FunctionLogsTool {
    async fn execute(&self, input: ToolInput) -> GcpResult<ToolResult> {
        let name: String = input.get_arg("functionName")?;
        let limit: usize = input.get_optional_arg("limit")?.unwrap_or(DEFAULT_LOG_LIMIT);
        let ctx = call_context(&self.adapter, &input);

        let entries = self.adapter.get_function_logs(&ctx, &name, limit).await?;
        Ok(ToolResult::success(serde_json::to_value(entries)?))
    }

    fn config(&self) -> &ToolConfig {
        &self.config
    }
}

// ============================================================================
// Function Errors Tool
// ============================================================================

/// Recent error entries for a function
pub struct FunctionErrorsTool {
    adapter: FunctionsAdapter,
    config: ToolConfig,
}

impl FunctionErrorsTool {
    pub fn new(adapter: FunctionsAdapter) -> Self {
        let config = Self::tool_config(timeout_secs(&adapter));
        Self { adapter, config }
    }

    fn tool_config(timeout_secs: u64) -> ToolConfig {
        let parameters = create_schema(
            serde_json::json!({
                "functionName": function_name_schema(),
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of error entries to return",
                    "minimum": 0,
                    "default": DEFAULT_ERROR_LIMIT
                }
            }),
            vec!["functionName"],
        );

        tool_config_with_timeout(
            "get-cloud-function-errors",
            "Get recent ERROR and CRITICAL log entries of a Cloud Function, including stack traces.",
            parameters,
            timeout_secs,
        )
    }
}

#[async_trait]
impl Tool for FunctionErrorsTool {
    async fn execute(&self, input: ToolInput) -> GcpResult<ToolResult> {
        let name: String = input.get_arg("functionName")?;
        let limit: usize = input.get_optional_arg("limit")?.unwrap_or(DEFAULT_ERROR_LIMIT);
        let ctx = call_context(&self.adapter, &input);

        let entries = self.adapter.get_function_errors(&ctx, &name, limit).await?;
        Ok(ToolResult::success(serde_json::to_value(entries)?))
    }

    fn config(&self) -> &ToolConfig {
        &self.config
    }
}

// ============================================================================
// Test HTTP Function Tool
// ============================================================================

/// Invoke an HTTP-triggered function
pub struct TestHttpFunctionTool {
    adapter: FunctionsAdapter,
    config: ToolConfig,
}

impl TestHttpFunctionTool {
    pub fn new(adapter: FunctionsAdapter) -> Self {
        let config = Self::tool_config(timeout_secs(&adapter));
        Self { adapter, config }
    }

    fn tool_config(timeout_secs: u64) -> ToolConfig {
        let parameters = create_schema(
            serde_json::json!({
                "functionName": function_name_schema(),
                "payload": {
                    "type": "object",
                    "description": "JSON body to POST to the function",
                    "default": {}
                },
                "timeoutSecs": {
                    "type": "integer",
                    "description": "Per-request timeout in seconds (defaults to the server timeout)",
                    "minimum": 1
                }
            }),
            vec!["functionName"],
        );

        tool_config_with_timeout(
            "test-http-function",
            "POST a JSON payload to an HTTP-triggered Cloud Function and return its status code and response.",
            parameters,
            timeout_secs,
        )
    }
}

#[async_trait]
impl Tool for TestHttpFunctionTool {
    async fn execute(&self, input: ToolInput) -> GcpResult<ToolResult> {
        let name: String = input.get_arg("functionName")?;
        let payload: serde_json::Map<String, serde_json::Value> =
            input.get_optional_arg("payload")?.unwrap_or_default();
        let payload = serde_json::Value::Object(payload);

        let ctx = match input.get_optional_arg::<u64>("timeoutSecs")? {
            Some(0) => {
                return Err(GcpError::tool(
                    "Invalid value for argument 'timeoutSecs': must be at least 1",
                ))
            }
            Some(secs) => CallContext::new(Duration::from_secs(secs))
                .with_cancellation(input.cancellation.clone()),
            None => call_context(&self.adapter, &input),
        };

        let invocation = self.adapter.test_http_function(&ctx, &name, &payload).await?;
        Ok(ToolResult::success(serde_json::to_value(invocation)?))
    }

    fn config(&self) -> &ToolConfig {
        &self.config
    }
}

// ============================================================================
// Function Metrics Tool
// ============================================================================

/// Log-derived execution metrics
pub struct FunctionMetricsTool {
    adapter: FunctionsAdapter,
    config: ToolConfig,
}

impl FunctionMetricsTool {
    pub fn new(adapter: FunctionsAdapter) -> Self {
        let config = Self::tool_config(timeout_secs(&adapter));
        Self { adapter, config }
    }

    fn tool_config(timeout_secs: u64) -> ToolConfig {
        let parameters = create_schema(
            serde_json::json!({
                "functionName": function_name_schema(),
                "hours": {
                    "type": "integer",
                    "description": "Size of the look-back window in hours",
                    "minimum": 0,
                    "default": DEFAULT_METRICS_HOURS
                }
            }),
            vec!["functionName"],
        );

        tool_config_with_timeout(
            "get-cloud-function-metrics",
            "Approximate execution count, error count and success rate of a Cloud Function from its logs.",
            parameters,
            timeout_secs,
        )
    }
}

#[async_trait]
impl Tool for FunctionMetricsTool {
    async fn execute(&self, input: ToolInput) -> GcpResult<ToolResult> {
        let name: String = input.get_arg("functionName")?;
        let hours: u32 = input.get_optional_arg("hours")?.unwrap_or(DEFAULT_METRICS_HOURS);
        let ctx = call_context(&self.adapter, &input);

        let metrics = self.adapter.get_function_metrics(&ctx, &name, hours).await?;
        Ok(ToolResult::success(serde_json::to_value(metrics)?))
    }

    fn config(&self) -> &ToolConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definitions_cover_all_tools() {
        let names: Vec<String> = FunctionsTools::definitions(60)
            .into_iter()
            .map(|d| d.name)
            .collect();

        assert_eq!(
            names,
            vec![
                "list-cloud-functions",
                "get-cloud-function-details",
                "get-cloud-function-source",
                "get-cloud-function-logs",
                "get-cloud-function-errors",
                "test-http-function",
                "get-cloud-function-metrics",
            ]
        );
    }

    #[test]
    fn test_function_name_is_required() {
        let definitions = FunctionsTools::definitions(60);
        for definition in definitions.iter().filter(|d| d.name != "list-cloud-functions") {
            assert_eq!(
                definition.parameters["required"],
                serde_json::json!(["functionName"]),
                "{} should require functionName",
                definition.name
            );
        }
    }
}
