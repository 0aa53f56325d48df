//! The Cloud Functions adapter
//!
//! Stateless apart from its configuration and the remote-service handles:
//! every operation is an independent round trip against the configured
//! project and region. Failures are reported as a structured `tracing`
//! event and then returned unchanged to the caller.

use chrono::{DateTime, Utc};
use gcpmcp_core::{GcpError, GcpResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::api::{FunctionsApi, LoggingApi};
use super::filter;
use super::rest::{transport_error, Endpoints, RestFunctionsClient, RestLoggingClient};
use super::types::{
    success_rate, ErrorLogEntry, FunctionDescriptor, HttpInvocation, ListEntriesRequest,
    LogEntry, Metrics, RawLogEntry, SourceLocation, TimeRange,
};
use super::CallContext;
use crate::auth::TokenProvider;

pub const DEFAULT_REGION: &str = "us-central1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Largest page the Cloud Logging API serves
const LOG_PAGE_SIZE: usize = 1000;

/// Project, region and per-call deadline the adapter is bound to
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterConfig {
    pub project_id: String,
    pub region: String,
    pub timeout: Duration,
}

impl AdapterConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            region: DEFAULT_REGION.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Uniform operations over Cloud Functions metadata, logs and HTTP endpoints
#[derive(Clone)]
pub struct FunctionsAdapter {
    config: AdapterConfig,
    functions: Arc<dyn FunctionsApi>,
    logging: Arc<dyn LoggingApi>,
    http: reqwest::Client,
}

impl FunctionsAdapter {
    pub fn new(
        config: AdapterConfig,
        functions: Arc<dyn FunctionsApi>,
        logging: Arc<dyn LoggingApi>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            config,
            functions,
            logging,
            http,
        }
    }

    /// Build an adapter backed by the Google REST APIs
    pub fn connect(
        config: AdapterConfig,
        endpoints: &Endpoints,
        tokens: Arc<dyn TokenProvider>,
    ) -> GcpResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("gcpmcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GcpError::config(format!("Failed to create HTTP client: {}", e)))?;

        let functions = RestFunctionsClient::new(http.clone(), &endpoints.functions, tokens.clone());
        let logging = RestLoggingClient::new(http.clone(), &endpoints.logging, tokens);

        Ok(Self::new(config, Arc::new(functions), Arc::new(logging), http))
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Same handles, different region. `self` is left as is.
    pub fn in_region(&self, region: impl Into<String>) -> Self {
        let mut adapter = self.clone();
        adapter.config.region = region.into();
        adapter
    }

    /// A call context with the configured timeout and a fresh token
    pub fn call_context(&self) -> CallContext {
        CallContext::new(self.config.timeout)
    }

    /// `projects/{project}/locations/{region}`
    pub fn parent(&self) -> String {
        format!(
            "projects/{}/locations/{}",
            self.config.project_id, self.config.region
        )
    }

    /// `projects/{project}/locations/{region}/functions/{name}`
    pub fn function_path(&self, name: &str) -> String {
        format!("{}/functions/{}", self.parent(), name)
    }

    fn report<T>(&self, operation: &'static str, function: &str, result: GcpResult<T>) -> GcpResult<T> {
        if let Err(e) = &result {
            error!(
                operation,
                function,
                project = %self.config.project_id,
                region = %self.config.region,
                error_kind = e.kind(),
                error = %e,
                "Cloud Functions operation failed"
            );
        }
        result
    }

    // ------------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------------

    /// All functions in the configured project and region, in upstream order
    pub async fn list_functions(&self, ctx: &CallContext) -> GcpResult<Vec<FunctionDescriptor>> {
        let result = self.fetch_all_functions(ctx).await;
        self.report("list_functions", "", result)
    }

    async fn fetch_all_functions(&self, ctx: &CallContext) -> GcpResult<Vec<FunctionDescriptor>> {
        let parent = self.parent();
        debug!(parent = %parent, "Listing functions");

        let mut descriptors = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = ctx
                .run(self.functions.list_functions(&parent, page_token.as_deref()))
                .await?;
            descriptors.extend(page.functions.iter().map(FunctionDescriptor::from));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(descriptors)
    }

    pub async fn get_function_details(
        &self,
        ctx: &CallContext,
        name: &str,
    ) -> GcpResult<FunctionDescriptor> {
        let result = self.fetch_details(ctx, name).await;
        self.report("get_function_details", name, result)
    }

    async fn fetch_details(&self, ctx: &CallContext, name: &str) -> GcpResult<FunctionDescriptor> {
        let path = self.function_path(name);
        debug!(function = %path, "Fetching function");
        let function = ctx.run(self.functions.get_function(&path)).await?;
        Ok(FunctionDescriptor::from(&function))
    }

    /// Resolve where the function's code lives. A failure to produce a
    /// download URL yields [`SourceLocation::Unavailable`], not an error.
    pub async fn get_function_source(
        &self,
        ctx: &CallContext,
        name: &str,
    ) -> GcpResult<SourceLocation> {
        let result = self.resolve_source(ctx, name).await;
        self.report("get_function_source", name, result)
    }

    async fn resolve_source(&self, ctx: &CallContext, name: &str) -> GcpResult<SourceLocation> {
        let path = self.function_path(name);
        let function = ctx.run(self.functions.get_function(&path)).await?;

        if let Some(url) = function.source_repository.as_ref().and_then(|r| r.url.clone()) {
            return Ok(SourceLocation::Repository {
                url,
                deployed_url: function
                    .source_repository
                    .as_ref()
                    .and_then(|r| r.deployed_url.clone()),
            });
        }

        if let Some(archive) = function.source_archive_url.filter(|u| !u.is_empty()) {
            return Ok(SourceLocation::Archive {
                source_archive_url: archive,
            });
        }

        match ctx.run(self.functions.generate_download_url(&path)).await {
            Ok(download_url) => Ok(SourceLocation::Download { download_url }),
            Err(GcpError::Cancelled) => Err(GcpError::Cancelled),
            Err(e) => {
                warn!(
                    function = %path,
                    error_kind = e.kind(),
                    error = %e,
                    "Source download URL unavailable"
                );
                Ok(SourceLocation::Unavailable {
                    reason: e.to_string(),
                    function_full_name: path,
                })
            }
        }
    }

    // ------------------------------------------------------------------------
    // Logs
    // ------------------------------------------------------------------------

    /// Newest-first log entries, at most `limit`, with no time window
    pub async fn get_function_logs(
        &self,
        ctx: &CallContext,
        name: &str,
        limit: usize,
    ) -> GcpResult<Vec<LogEntry>> {
        let result = self
            .query_entries(ctx, filter::function_logs(name), limit)
            .await
            .map(|entries| entries.iter().map(LogEntry::from).collect());
        self.report("get_function_logs", name, result)
    }

    /// Newest-first entries at ERROR severity or above, at most `limit`
    pub async fn get_function_errors(
        &self,
        ctx: &CallContext,
        name: &str,
        limit: usize,
    ) -> GcpResult<Vec<ErrorLogEntry>> {
        let result = self
            .query_entries(ctx, filter::function_errors(name), limit)
            .await
            .map(|entries| entries.iter().map(ErrorLogEntry::from).collect());
        self.report("get_function_errors", name, result)
    }

    fn entries_request(&self, filter: String, page_size: usize) -> ListEntriesRequest {
        ListEntriesRequest {
            resource_names: vec![format!("projects/{}", self.config.project_id)],
            filter,
            order_by: "timestamp desc".to_string(),
            page_size: page_size.clamp(1, LOG_PAGE_SIZE) as u32,
            page_token: None,
        }
    }

    async fn query_entries(
        &self,
        ctx: &CallContext,
        filter: String,
        limit: usize,
    ) -> GcpResult<Vec<RawLogEntry>> {
        let mut entries = Vec::new();
        if limit == 0 {
            return Ok(entries);
        }

        debug!(filter = %filter, limit, "Querying log entries");
        let mut request = self.entries_request(filter, limit);
        loop {
            let page = ctx.run(self.logging.list_entries(&request)).await?;
            entries.extend(page.entries);

            if entries.len() >= limit {
                entries.truncate(limit);
                break;
            }
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => request.page_token = Some(token),
                None => break,
            }
        }
        Ok(entries)
    }

    /// Count every entry matching `filter`, following pagination to the end
    async fn count_entries(&self, ctx: &CallContext, filter: String) -> GcpResult<u64> {
        let mut request = self.entries_request(filter, LOG_PAGE_SIZE);
        let mut count = 0u64;
        loop {
            let page = ctx.run(self.logging.list_entries(&request)).await?;
            count += page.entries.len() as u64;

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => request.page_token = Some(token),
                None => break,
            }
        }
        Ok(count)
    }

    // ------------------------------------------------------------------------
    // Invocation and metrics
    // ------------------------------------------------------------------------

    /// POST `payload` as JSON to the function's HTTPS trigger
    pub async fn test_http_function(
        &self,
        ctx: &CallContext,
        name: &str,
        payload: &serde_json::Value,
    ) -> GcpResult<HttpInvocation> {
        let result = self.invoke(ctx, name, payload).await;
        self.report("test_http_function", name, result)
    }

    async fn invoke(
        &self,
        ctx: &CallContext,
        name: &str,
        payload: &serde_json::Value,
    ) -> GcpResult<HttpInvocation> {
        let details = self.fetch_details(ctx, name).await?;
        let url = details.uri.ok_or_else(|| {
            GcpError::validation(format!("Function {} does not have an HTTP trigger", name))
        })?;

        debug!(function = %name, url = %url, "Invoking HTTP function");

        let (status_code, body) = ctx
            .run(async {
                let response = self
                    .http
                    .post(&url)
                    .json(payload)
                    .send()
                    .await
                    .map_err(transport_error)?;
                let status = response.status().as_u16();
                let body = response.text().await.map_err(transport_error)?;
                Ok::<_, GcpError>((status, body))
            })
            .await?;

        let response = serde_json::from_str(&body).unwrap_or(serde_json::Value::String(body));
        Ok(HttpInvocation {
            status_code,
            response,
        })
    }

    /// Log-line based execution statistics over the last `hours`
    pub async fn get_function_metrics(
        &self,
        ctx: &CallContext,
        name: &str,
        hours: u32,
    ) -> GcpResult<Metrics> {
        let result = self.compute_metrics(ctx, name, hours, Utc::now()).await;
        self.report("get_function_metrics", name, result)
    }

    async fn compute_metrics(
        &self,
        ctx: &CallContext,
        name: &str,
        hours: u32,
        now: DateTime<Utc>,
    ) -> GcpResult<Metrics> {
        let (start, end) = metrics_window(now, hours)?;

        let errors_filter = filter::since(&filter::function_errors(name), &start);
        let all_filter = filter::since(&filter::function_logs(name), &start);

        let (total_errors, total_executions) = tokio::try_join!(
            self.count_entries(ctx, errors_filter),
            self.count_entries(ctx, all_filter),
        )?;

        debug!(function = %name, total_executions, total_errors, "Computed log metrics");

        Ok(Metrics {
            total_executions,
            total_errors,
            success_rate: success_rate(total_executions, total_errors),
            time_range: TimeRange {
                start: filter::rfc3339(&start),
                end: filter::rfc3339(&end),
                hours,
            },
        })
    }
}

/// `[now - hours, now]`
pub fn metrics_window(now: DateTime<Utc>, hours: u32) -> GcpResult<(DateTime<Utc>, DateTime<Utc>)> {
    let span = chrono::Duration::seconds(i64::from(hours) * 3600);
    let start = now
        .checked_sub_signed(span)
        .ok_or_else(|| GcpError::validation(format!("hours out of range: {}", hours)))?;
    Ok((start, now))
}
