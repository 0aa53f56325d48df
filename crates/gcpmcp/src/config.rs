//! Server configuration
//!
//! Settings come from an optional YAML file, overridden by command-line
//! flags and their environment variables.
//!
//! ```yaml
//! project_id: my-project
//! region: europe-west1
//! timeout_secs: 30
//! log_level: info
//! endpoints:
//!   functions: https://cloudfunctions.googleapis.com
//!   logging: https://logging.googleapis.com
//! credentials:
//!   token_env: GOOGLE_OAUTH_ACCESS_TOKEN
//!   gcloud_path: gcloud
//! ```

use anyhow::{bail, Context, Result};
use gcpmcp_tools::auth::DEFAULT_TOKEN_ENV;
use gcpmcp_tools::functions::adapter::DEFAULT_TIMEOUT_SECS;
use gcpmcp_tools::functions::DEFAULT_REGION;
use gcpmcp_tools::{AdapterConfig, Endpoints};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::cli::Cli;

/// Configuration file contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Project to operate on
    #[serde(default)]
    pub project_id: Option<String>,

    /// Cloud Functions region
    #[serde(default = "default_region")]
    pub region: String,

    /// Timeout for each upstream request
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Default log filter
    #[serde(default)]
    pub log_level: Option<String>,

    /// API base URLs
    #[serde(default)]
    pub endpoints: Endpoints,

    /// Where access tokens come from
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            region: default_region(),
            timeout_secs: default_timeout(),
            log_level: None,
            endpoints: Endpoints::default(),
            credentials: CredentialsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsConfig {
    /// Environment variable checked first for a ready-made access token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// gcloud binary used for application default credentials
    #[serde(default = "default_gcloud_path")]
    pub gcloud_path: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
            gcloud_path: default_gcloud_path(),
        }
    }
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

fn default_gcloud_path() -> String {
    "gcloud".to_string()
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Apply command-line overrides
    pub fn merge_cli(mut self, cli: &Cli) -> Self {
        if let Some(project) = &cli.project {
            self.project_id = Some(project.clone());
        }
        if let Some(region) = &cli.region {
            self.region = region.clone();
        }
        if let Some(timeout) = cli.timeout_secs {
            self.timeout_secs = timeout;
        }
        if let Some(level) = &cli.log_level {
            self.log_level = Some(level.clone());
        }
        self
    }

    /// Adapter settings. Fails when no project is configured.
    pub fn adapter_config(&self) -> Result<AdapterConfig> {
        let project_id = match self.project_id.as_deref().map(str::trim) {
            Some(project) if !project.is_empty() => project.to_string(),
            _ => bail!(
                "No project configured: pass --project, set GOOGLE_CLOUD_PROJECT, or add project_id to the config file"
            ),
        };

        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than zero");
        }

        Ok(AdapterConfig::new(project_id)
            .with_region(self.region.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["gcpmcp"];
        argv.extend_from_slice(args);
        argv.push("tools");
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_load_yaml_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "project_id: from-file\ntimeout_secs: 15").unwrap();

        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.project_id.as_deref(), Some("from-file"));
        assert_eq!(config.region, "us-central1");
        assert_eq!(config.timeout_secs, 15);
        assert_eq!(config.endpoints, Endpoints::default());
        assert_eq!(config.credentials.token_env, "GOOGLE_OAUTH_ACCESS_TOKEN");
    }

    #[test]
    fn test_load_rejects_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "projectId: typo").unwrap();

        let err = FileConfig::load(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = FileConfig {
            project_id: Some("from-file".to_string()),
            region: "europe-west1".to_string(),
            ..Default::default()
        };

        let merged = file.merge_cli(&cli(&["--project", "from-cli", "--timeout-secs", "5"]));
        assert_eq!(merged.project_id.as_deref(), Some("from-cli"));
        assert_eq!(merged.region, "europe-west1");

        let adapter = merged.adapter_config().unwrap();
        assert_eq!(adapter.project_id, "from-cli");
        assert_eq!(adapter.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_project_is_error() {
        let err = FileConfig::default().adapter_config().unwrap_err();
        assert!(err.to_string().contains("No project configured"));

        let blank = FileConfig {
            project_id: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(blank.adapter_config().is_err());
    }
}
