//! Cloud Functions adapter
//!
//! Normalizes three independent upstream surfaces into one set of
//! operations keyed by a fixed project and region:
//!
//! - function metadata (Cloud Functions v1)
//! - function logs and log-derived metrics (Cloud Logging v2)
//! - direct invocation of HTTP-triggered functions
//!
//! Every outbound call runs under a [`CallContext`], which bounds it with a
//! timeout and aborts it when the caller's cancellation token fires.

pub mod adapter;
pub mod api;
pub mod filter;
pub mod rest;
pub mod types;

pub use adapter::{AdapterConfig, FunctionsAdapter, DEFAULT_REGION};
pub use api::{FunctionsApi, LoggingApi};
pub use rest::{Endpoints, RestFunctionsClient, RestLoggingClient};
pub use types::{
    ErrorLogEntry, EventTrigger, FunctionDescriptor, HttpInvocation, LogEntry, Metrics,
    SourceLocation, TimeRange,
};

use gcpmcp_core::{GcpError, GcpResult};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Deadline and cancellation applied to each outbound call
#[derive(Debug, Clone)]
pub struct CallContext {
    pub timeout: Duration,
    pub cancellation: CancellationToken,
}

impl CallContext {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Drive one upstream call to completion, timeout or cancellation
    pub async fn run<T, F>(&self, call: F) -> GcpResult<T>
    where
        F: Future<Output = GcpResult<T>>,
    {
        if self.cancellation.is_cancelled() {
            return Err(GcpError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(GcpError::Cancelled),
            result = tokio::time::timeout(self.timeout, call) => {
                result.map_err(|_| GcpError::Timeout(self.timeout))?
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_passes_result_through() {
        let ctx = CallContext::new(Duration::from_secs(1));
        let value = ctx.run(async { Ok::<_, GcpError>(42) }).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_times_out() {
        let ctx = CallContext::new(Duration::from_secs(5));
        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<_, GcpError>(())
            })
            .await;
        assert!(matches!(result, Err(GcpError::Timeout(d)) if d == Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_run_cancelled() {
        let token = CancellationToken::new();
        let ctx = CallContext::new(Duration::from_secs(60)).with_cancellation(token.clone());

        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel.cancel();
        });

        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, GcpError>(())
            })
            .await;
        assert!(matches!(result, Err(GcpError::Cancelled)));
    }

    #[tokio::test]
    async fn test_run_already_cancelled_skips_call() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = CallContext::new(Duration::from_secs(1)).with_cancellation(token);

        let result = ctx
            .run(async { Err::<(), _>(GcpError::tool("must not be polled")) })
            .await;
        assert!(matches!(result, Err(GcpError::Cancelled)));
    }
}
