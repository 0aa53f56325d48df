use anyhow::Result;
use gcpmcp_tools::FunctionsTools;

use crate::config::FileConfig;

/// Print every tool definition. Needs neither a project nor credentials.
pub async fn execute(config: &FileConfig) -> Result<()> {
    let definitions = FunctionsTools::definitions(config.timeout_secs);
    println!("{}", serde_json::to_string_pretty(&definitions)?);
    Ok(())
}
