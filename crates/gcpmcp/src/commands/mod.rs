//! CLI subcommands and the executor wiring they share

pub mod call;
pub mod serve;
pub mod tools;
pub mod version;

use anyhow::{Context, Result};
use gcpmcp_tools::auth::{GcloudTokenProvider, StaticTokenProvider, TokenProvider};
use gcpmcp_tools::{BuiltinToolExecutor, FunctionsAdapter, FunctionsTools, ToolRegistry};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::FileConfig;

/// Pick a token source: a token in the environment first, gcloud otherwise
fn token_provider(config: &FileConfig) -> Arc<dyn TokenProvider> {
    let credentials = &config.credentials;
    if let Some(provider) = StaticTokenProvider::from_env(&credentials.token_env) {
        info!(env = %credentials.token_env, "Using access token from environment");
        return Arc::new(provider);
    }

    let gcloud = GcloudTokenProvider::new(credentials.gcloud_path.clone());
    if !gcloud.is_available() {
        warn!(
            gcloud = %credentials.gcloud_path,
            env = %credentials.token_env,
            "gcloud not found and no access token set; upstream calls will fail to authenticate"
        );
    }
    Arc::new(gcloud)
}

/// Build the adapter and a tool executor exposing its operations
pub(crate) fn build_executor(config: &FileConfig) -> Result<BuiltinToolExecutor> {
    let adapter_config = config.adapter_config()?;
    info!(
        project = %adapter_config.project_id,
        region = %adapter_config.region,
        timeout_secs = adapter_config.timeout.as_secs(),
        "Configuring Cloud Functions adapter"
    );

    let adapter = FunctionsAdapter::connect(adapter_config, &config.endpoints, token_provider(config))
        .context("Failed to create Cloud Functions adapter")?;

    let mut registry = ToolRegistry::new();
    registry.register_all(FunctionsTools::all(&adapter));
    Ok(registry.into_executor())
}
