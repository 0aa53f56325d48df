use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;
use crate::config::FileConfig;

/// gcpmcp - Google Cloud Functions tools over the Model Context Protocol
#[derive(Parser, Debug)]
#[command(name = "gcpmcp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(long, short = 'c', global = true, env = "GCPMCP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Google Cloud project ID (overrides config)
    #[arg(long, short = 'p', global = true, env = "GOOGLE_CLOUD_PROJECT")]
    pub project: Option<String>,

    /// Cloud Functions region (overrides config)
    #[arg(long, short = 'r', global = true, env = "GCPMCP_REGION")]
    pub region: Option<String>,

    /// Timeout in seconds for each upstream request (overrides config)
    #[arg(long, global = true, env = "GCPMCP_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Log level filter, e.g. info or gcpmcp_tools=debug (RUST_LOG wins)
    #[arg(long, global = true, env = "GCPMCP_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve tools over MCP (JSON-RPC on stdin/stdout)
    Serve,

    /// Print the tool definitions as JSON
    Tools,

    /// Invoke a single tool and print its result
    Call {
        /// Tool name, e.g. get-cloud-function-details
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },

    /// Show version information
    Version,
}

impl Cli {
    /// Resolve the configuration file and command-line overrides
    pub fn load_config(&self) -> anyhow::Result<FileConfig> {
        let config = match &self.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Ok(config.merge_cli(self))
    }

    pub async fn execute(self, config: FileConfig) -> anyhow::Result<()> {
        match self.command {
            Commands::Serve => commands::serve::execute(&config).await,
            Commands::Tools => commands::tools::execute(&config).await,
            Commands::Call { tool, args } => commands::call::execute(&config, &tool, &args).await,
            Commands::Version => commands::version::execute().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_call() {
        let cli = Cli::try_parse_from([
            "gcpmcp",
            "--project",
            "my-project",
            "call",
            "get-cloud-function-logs",
            "--args",
            r#"{"functionName":"f","limit":5}"#,
        ])
        .unwrap();

        assert_eq!(cli.project.as_deref(), Some("my-project"));
        match cli.command {
            Commands::Call { tool, args } => {
                assert_eq!(tool, "get-cloud-function-logs");
                assert!(args.contains("\"limit\":5"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["gcpmcp", "serve", "--region", "asia-east1"]).unwrap();
        assert_eq!(cli.region.as_deref(), Some("asia-east1"));
        assert!(matches!(cli.command, Commands::Serve));
    }
}
