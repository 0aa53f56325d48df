//! REST clients for cloudfunctions.googleapis.com and logging.googleapis.com

use async_trait::async_trait;
use gcpmcp_core::{GcpError, GcpResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::api::{FunctionsApi, LoggingApi};
use super::types::{CloudFunction, FunctionsPage, ListEntriesRequest, LogEntriesPage};
use crate::auth::TokenProvider;

pub const DEFAULT_FUNCTIONS_ENDPOINT: &str = "https://cloudfunctions.googleapis.com";
pub const DEFAULT_LOGGING_ENDPOINT: &str = "https://logging.googleapis.com";

/// Base URLs of the Google APIs, overridable for emulators and tests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_functions_endpoint")]
    pub functions: String,
    #[serde(default = "default_logging_endpoint")]
    pub logging: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            functions: default_functions_endpoint(),
            logging: default_logging_endpoint(),
        }
    }
}

fn default_functions_endpoint() -> String {
    DEFAULT_FUNCTIONS_ENDPOINT.to_string()
}

fn default_logging_endpoint() -> String {
    DEFAULT_LOGGING_ENDPOINT.to_string()
}

/// Google API error envelope: `{"error": {"code", "message", "status"}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match (envelope.error.status, envelope.error.message) {
            (Some(code), Some(message)) => format!("{}: {}", code, message),
            (None, Some(message)) => message,
            (Some(code), None) => code,
            (None, None) => format!("HTTP {}", status),
        },
        Err(_) if body.trim().is_empty() => format!("HTTP {}", status),
        Err(_) => body.trim().to_string(),
    }
}

pub(crate) fn transport_error(e: reqwest::Error) -> GcpError {
    if e.is_timeout() {
        GcpError::transient(format!("Request timeout: {}", e))
    } else if e.is_connect() {
        GcpError::transient(format!("Connection failed: {}", e))
    } else {
        GcpError::transient(format!("Request failed: {}", e))
    }
}

/// Authenticated JSON client bound to one API base URL
#[derive(Clone)]
struct GoogleApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl GoogleApiClient {
    fn new(http: reqwest::Client, base_url: &str, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> GcpResult<T> {
        let token = self.tokens.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(GcpError::from_status(
                status.as_u16(),
                error_message(status.as_u16(), &body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| GcpError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> GcpResult<T> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        self.send(self.http.get(&url).query(query)).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> GcpResult<T> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        self.send(self.http.post(&url).json(body)).await
    }
}

/// Cloud Functions v1 REST client
#[derive(Clone)]
pub struct RestFunctionsClient {
    api: GoogleApiClient,
}

impl RestFunctionsClient {
    pub fn new(http: reqwest::Client, endpoint: &str, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            api: GoogleApiClient::new(http, endpoint, tokens),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateDownloadUrlResponse {
    download_url: Option<String>,
}

#[async_trait]
impl FunctionsApi for RestFunctionsClient {
    async fn list_functions(
        &self,
        parent: &str,
        page_token: Option<&str>,
    ) -> GcpResult<FunctionsPage> {
        let path = format!("v1/{}/functions", parent);
        let query: Vec<(&str, &str)> = page_token.map(|t| vec![("pageToken", t)]).unwrap_or_default();
        self.api.get(&path, &query).await
    }

    async fn get_function(&self, name: &str) -> GcpResult<CloudFunction> {
        self.api.get(&format!("v1/{}", name), &[]).await
    }

    async fn generate_download_url(&self, name: &str) -> GcpResult<String> {
        let response: GenerateDownloadUrlResponse = self
            .api
            .post(&format!("v1/{}:generateDownloadUrl", name), &serde_json::json!({}))
            .await?;

        response
            .download_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| GcpError::Decode("generateDownloadUrl returned no downloadUrl".to_string()))
    }
}

/// Cloud Logging v2 REST client
#[derive(Clone)]
pub struct RestLoggingClient {
    api: GoogleApiClient,
}

impl RestLoggingClient {
    pub fn new(http: reqwest::Client, endpoint: &str, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            api: GoogleApiClient::new(http, endpoint, tokens),
        }
    }
}

#[async_trait]
impl LoggingApi for RestLoggingClient {
    async fn list_entries(&self, request: &ListEntriesRequest) -> GcpResult<LogEntriesPage> {
        self.api.post("v2/entries:list", request).await
    }
}
