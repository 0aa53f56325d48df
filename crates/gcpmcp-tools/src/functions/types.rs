//! Wire types for the Cloud Functions v1 and Cloud Logging v2 REST APIs,
//! and the normalized views returned to tool callers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// Upstream: Cloud Functions v1
// ============================================================================

/// `CloudFunction` resource as returned by cloudfunctions.googleapis.com/v1
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudFunction {
    /// Fully qualified: `projects/{p}/locations/{r}/functions/{name}`
    pub name: String,
    pub status: Option<String>,
    pub entry_point: Option<String>,
    pub runtime: Option<String>,
    pub timeout: Option<String>,
    pub available_memory_mb: Option<i64>,
    pub service_account_email: Option<String>,
    pub update_time: Option<String>,
    /// int64 encoded as a JSON string
    pub version_id: Option<String>,
    pub environment_variables: Option<BTreeMap<String, String>>,
    pub build_id: Option<String>,
    pub ingress_settings: Option<String>,
    pub https_trigger: Option<HttpsTrigger>,
    pub event_trigger: Option<RawEventTrigger>,
    pub source_repository: Option<SourceRepository>,
    pub source_archive_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpsTrigger {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEventTrigger {
    pub event_type: Option<String>,
    pub resource: Option<String>,
    pub service: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRepository {
    pub url: Option<String>,
    pub deployed_url: Option<String>,
}

/// One page of `functions.list`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionsPage {
    #[serde(default)]
    pub functions: Vec<CloudFunction>,
    pub next_page_token: Option<String>,
}

// ============================================================================
// Upstream: Cloud Logging v2
// ============================================================================

/// Body of `entries.list`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntriesRequest {
    pub resource_names: Vec<String>,
    pub filter: String,
    pub order_by: String,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

/// `LogEntry` resource. Exactly one payload field is normally set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLogEntry {
    pub timestamp: Option<String>,
    pub severity: Option<String>,
    pub text_payload: Option<String>,
    pub json_payload: Option<Value>,
    pub proto_payload: Option<Value>,
    pub trace: Option<String>,
}

impl RawLogEntry {
    /// The entry payload as JSON, whichever representation upstream used
    pub fn payload(&self) -> Option<Value> {
        if let Some(text) = &self.text_payload {
            return Some(Value::String(text.clone()));
        }
        self.json_payload
            .clone()
            .or_else(|| self.proto_payload.clone())
    }
}

/// One page of `entries.list`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntriesPage {
    #[serde(default)]
    pub entries: Vec<RawLogEntry>,
    pub next_page_token: Option<String>,
}

// ============================================================================
// Tool-facing views
// ============================================================================

/// Normalized metadata for one deployed function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDescriptor {
    /// Bare function name (last segment of the resource name)
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_memory_mb: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment_variables: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress_settings: Option<String>,
    /// HTTPS trigger URL, present only for HTTP functions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_trigger: Option<EventTrigger>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTrigger {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

/// Last `/`-delimited segment of a resource name
pub fn short_name(resource_name: &str) -> &str {
    resource_name.rsplit('/').next().unwrap_or(resource_name)
}

impl From<&CloudFunction> for FunctionDescriptor {
    fn from(f: &CloudFunction) -> Self {
        Self {
            name: short_name(&f.name).to_string(),
            status: f.status.clone(),
            entry_point: f.entry_point.clone(),
            runtime: f.runtime.clone(),
            timeout: f.timeout.clone(),
            available_memory_mb: f.available_memory_mb,
            service_account_email: f.service_account_email.clone(),
            update_time: f.update_time.clone(),
            version_id: f.version_id.clone(),
            environment_variables: f.environment_variables.clone(),
            build_id: f.build_id.clone(),
            ingress_settings: f.ingress_settings.clone(),
            uri: f.https_trigger.as_ref().and_then(|t| t.url.clone()),
            event_trigger: f.event_trigger.as_ref().map(|t| EventTrigger {
                event_type: t.event_type.clone(),
                resource: t.resource.clone(),
                service: t.service.clone(),
            }),
        }
    }
}

/// Where the deployable code of a function can be found
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SourceLocation {
    #[serde(rename_all = "camelCase")]
    Repository {
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        deployed_url: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Archive { source_archive_url: String },
    #[serde(rename_all = "camelCase")]
    Download { download_url: String },
    #[serde(rename_all = "camelCase")]
    Unavailable {
        reason: String,
        function_full_name: String,
    },
}

/// One log line attributed to a function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub severity: String,
    pub message: String,
    pub trace: String,
}

/// Log line at ERROR or above, with the stack trace when the payload has one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    #[serde(flatten)]
    pub entry: LogEntry,
    pub stack: String,
}

fn payload_message(payload: Option<&Value>) -> String {
    match payload {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(structured) => match structured.get("message") {
            Some(Value::String(message)) => message.clone(),
            Some(Value::Null) | None => structured.to_string(),
            Some(other) => other.to_string(),
        },
    }
}

impl From<&RawLogEntry> for LogEntry {
    fn from(raw: &RawLogEntry) -> Self {
        Self {
            timestamp: raw.timestamp.clone().unwrap_or_default(),
            severity: raw.severity.clone().unwrap_or_default(),
            message: payload_message(raw.payload().as_ref()),
            trace: raw.trace.clone().unwrap_or_default(),
        }
    }
}

impl From<&RawLogEntry> for ErrorLogEntry {
    fn from(raw: &RawLogEntry) -> Self {
        let stack = raw
            .payload()
            .and_then(|p| p.get("stack").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_default();

        Self {
            entry: LogEntry::from(raw),
            stack,
        }
    }
}

/// Log-derived execution statistics over a time window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_executions: u64,
    pub total_errors: u64,
    /// Percentage; 100 when no executions were logged
    pub success_rate: f64,
    pub time_range: TimeRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
    pub hours: u32,
}

pub fn success_rate(total_executions: u64, total_errors: u64) -> f64 {
    if total_executions == 0 {
        return 100.0;
    }
    (1.0 - total_errors as f64 / total_executions as f64) * 100.0
}

/// Response of a test invocation of an HTTP function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpInvocation {
    pub status_code: u16,
    /// Parsed JSON body, or the raw text when the body is not JSON
    pub response: Value,
}
