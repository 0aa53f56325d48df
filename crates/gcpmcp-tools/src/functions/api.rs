//! Remote-service handles used by the adapter
//!
//! The adapter only talks to these traits; the REST implementations live in
//! `rest`, and tests substitute in-memory fakes.

use async_trait::async_trait;
use gcpmcp_core::GcpResult;

use super::types::{CloudFunction, FunctionsPage, ListEntriesRequest, LogEntriesPage};

/// Cloud Functions management API
#[async_trait]
pub trait FunctionsApi: Send + Sync {
    /// One page of functions under `parent` (`projects/{p}/locations/{r}`)
    async fn list_functions(&self, parent: &str, page_token: Option<&str>)
        -> GcpResult<FunctionsPage>;

    /// Fetch a function by its fully qualified name
    async fn get_function(&self, name: &str) -> GcpResult<CloudFunction>;

    /// Signed URL for downloading the deployed source archive
    async fn generate_download_url(&self, name: &str) -> GcpResult<String>;
}

/// Cloud Logging query API
#[async_trait]
pub trait LoggingApi: Send + Sync {
    async fn list_entries(&self, request: &ListEntriesRequest) -> GcpResult<LogEntriesPage>;
}
