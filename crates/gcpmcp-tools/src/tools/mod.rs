//! Tool implementations
//!
//! - `functions` - Cloud Functions inspection, logs, metrics and HTTP invocation

pub mod functions;

/// Common utilities for tool implementations
pub mod common {
    use gcpmcp_core::{ToolConfig, ToolType};
    use std::collections::HashMap;

    /// Create a standard JSON schema for a tool with required and optional parameters
    pub fn create_schema(
        properties: serde_json::Value,
        required: Vec<&str>,
    ) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }

    /// Create a built-in tool config with an explicit per-call timeout
    pub fn tool_config_with_timeout(
        name: &str,
        description: &str,
        parameters: serde_json::Value,
        timeout_secs: u64,
    ) -> ToolConfig {
        ToolConfig {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
            tool_type: ToolType::Builtin,
            timeout_secs,
            extra: HashMap::new(),
        }
    }

    /// Execute a command and return structured output
    pub async fn execute_command(
        program: &str,
        args: &[&str],
        timeout_secs: u64,
    ) -> Result<CommandOutput, String> {
        use std::time::Duration;
        use tokio::process::Command;

        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd.stdin(std::process::Stdio::null());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());
        cmd.kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| format!("Failed to spawn {}: {}", program, e))?;

        let output = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| format!("Command timed out after {}s", timeout_secs))?
        .map_err(|e| format!("Command failed: {}", e))?;

        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
        })
    }

    /// Command execution output
    #[derive(Debug, Clone, serde::Serialize)]
    pub struct CommandOutput {
        pub exit_code: i32,
        pub stdout: String,
        pub stderr: String,
        pub success: bool,
    }
}
