//! Access tokens for Google APIs
//!
//! Identity is supplied from outside the process. Two sources are supported:
//!
//! - An access token placed in the environment (`GOOGLE_OAUTH_ACCESS_TOKEN`
//!   by default), e.g. by a wrapper script or CI job
//! - Application default credentials through the Google Cloud SDK
//!   (`gcloud auth application-default print-access-token`)
//!
//! Tokens are fetched per request and never cached here.

use async_trait::async_trait;
use gcpmcp_core::{GcpError, GcpResult};
use tracing::debug;

use crate::tools::common::execute_command;

/// Default environment variable holding a pre-issued access token
pub const DEFAULT_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

const GCLOUD_TOKEN_TIMEOUT_SECS: u64 = 30;

/// Source of OAuth2 bearer tokens
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> GcpResult<String>;
}

/// Fixed token, either given directly or read once from the environment
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    /// Read a token from `var`. Unset or blank variables yield `None`.
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(Self::new)
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> GcpResult<String> {
        Ok(self.token.clone())
    }
}

/// Application default credentials via the gcloud CLI
#[derive(Debug, Clone)]
pub struct GcloudTokenProvider {
    program: String,
}

impl GcloudTokenProvider {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Check if the configured gcloud binary can be found
    pub fn is_available(&self) -> bool {
        which::which(&self.program).is_ok()
    }
}

impl Default for GcloudTokenProvider {
    fn default() -> Self {
        Self::new("gcloud")
    }
}

#[async_trait]
impl TokenProvider for GcloudTokenProvider {
    async fn access_token(&self) -> GcpResult<String> {
        debug!(program = %self.program, "Requesting application default access token");

        let output = execute_command(
            &self.program,
            &["auth", "application-default", "print-access-token"],
            GCLOUD_TOKEN_TIMEOUT_SECS,
        )
        .await
        .map_err(GcpError::auth)?;

        if !output.success {
            return Err(GcpError::auth(format!(
                "gcloud exited with code {}: {}",
                output.exit_code,
                output.stderr.trim()
            )));
        }

        let token = output.stdout.trim();
        if token.is_empty() {
            return Err(GcpError::auth("gcloud returned an empty access token"));
        }
        Ok(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token() {
        let provider = StaticTokenProvider::new("ya29.test");
        assert_eq!(provider.access_token().await.unwrap(), "ya29.test");
        assert!(!format!("{:?}", provider).contains("ya29"));
    }

    #[test]
    fn test_static_token_from_env_ignores_blank() {
        std::env::set_var("GCPMCP_TEST_BLANK_TOKEN", "   ");
        assert!(StaticTokenProvider::from_env("GCPMCP_TEST_BLANK_TOKEN").is_none());
        assert!(StaticTokenProvider::from_env("GCPMCP_TEST_UNSET_TOKEN").is_none());
    }

    #[tokio::test]
    async fn test_gcloud_missing_binary_is_auth_error() {
        let provider = GcloudTokenProvider::new("gcpmcp-no-such-gcloud-binary");
        assert!(!provider.is_available());

        let err = provider.access_token().await.unwrap_err();
        assert!(matches!(err, GcpError::Auth(_)));
    }
}
