use anyhow::{anyhow, bail, Context, Result};
use gcpmcp_core::{ToolExecutor, ToolInput};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::FileConfig;

/// Invoke one tool and print its result as JSON
pub async fn execute(config: &FileConfig, tool: &str, args: &str) -> Result<()> {
    let arguments: Value =
        serde_json::from_str(args).context("Tool arguments must be a JSON object")?;
    if !arguments.is_object() {
        bail!("Tool arguments must be a JSON object");
    }

    let executor = super::build_executor(config)?;
    if executor.get_tool(tool).is_none() {
        bail!("Unknown tool: {}", tool);
    }

    let cancellation = CancellationToken::new();
    let signal = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal.cancel();
        }
    });

    let input = ToolInput::new(arguments).with_cancellation(cancellation);
    let result = executor.execute_tool(tool, input).await?;
    if !result.success {
        return Err(anyhow!(result
            .error
            .unwrap_or_else(|| format!("Tool {} failed", tool))));
    }

    println!("{}", serde_json::to_string_pretty(&result.data)?);
    Ok(())
}
