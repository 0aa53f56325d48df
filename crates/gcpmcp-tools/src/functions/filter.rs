//! Cloud Logging filter expressions for function logs

use chrono::{DateTime, SecondsFormat, Utc};

/// Quote a value for use inside a logging filter string literal
fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// All entries emitted by a Cloud Function
pub fn function_logs(function_name: &str) -> String {
    format!(
        "resource.labels.function_name={} AND resource.type=\"cloud_function\"",
        quote(function_name)
    )
}

/// Entries at ERROR severity or above
pub fn function_errors(function_name: &str) -> String {
    format!("{} AND severity>=ERROR", function_logs(function_name))
}

/// Restrict a filter to entries at or after `start`
pub fn since(filter: &str, start: &DateTime<Utc>) -> String {
    format!("{} AND timestamp>={}", filter, quote(&rfc3339(start)))
}

pub fn rfc3339(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
