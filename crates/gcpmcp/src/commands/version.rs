use anyhow::Result;

pub async fn execute() -> Result<()> {
    println!("gcpmcp {}", gcpmcp_core::VERSION);
    println!("MCP protocol {}", crate::mcp::MCP_VERSION);
    Ok(())
}
