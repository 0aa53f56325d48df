//! gcpmcp Tools - Google Cloud operations exposed as tools
//!
//! This crate adapts Google Cloud REST APIs into the tool abstraction from
//! `gcpmcp-core`. The Cloud Functions adapter is the centrepiece: it turns
//! function metadata, Cloud Logging entries and HTTP invocations into a
//! stable, tool-facing JSON schema.
//!
//! # Example
//!
//! ```rust,ignore
//! use gcpmcp_tools::{AdapterConfig, Endpoints, FunctionsAdapter, FunctionsTools, ToolRegistry};
//! use gcpmcp_tools::auth::GcloudTokenProvider;
//! use std::sync::Arc;
//!
//! let config = AdapterConfig::new("my-project");
//! let tokens = Arc::new(GcloudTokenProvider::default());
//! let adapter = FunctionsAdapter::connect(config, &Endpoints::default(), tokens)?;
//!
//! let mut registry = ToolRegistry::new();
//! registry.register_all(FunctionsTools::all(&adapter));
//! let executor = registry.into_executor();
//! ```

pub mod auth;
pub mod functions;
pub mod registry;
pub mod tools;

pub use functions::{AdapterConfig, CallContext, Endpoints, FunctionsAdapter};
pub use registry::{BuiltinToolExecutor, ToolRegistry};
pub use tools::functions::FunctionsTools;

/// Prelude module for convenient imports
pub mod prelude {
    pub use super::auth::{GcloudTokenProvider, StaticTokenProvider, TokenProvider};
    pub use super::functions::{AdapterConfig, CallContext, Endpoints, FunctionsAdapter};
    pub use super::registry::{BuiltinToolExecutor, ToolRegistry};
    pub use super::tools::functions::FunctionsTools;
    pub use gcpmcp_core::{Tool, ToolExecutor, ToolInput, ToolResult, ToolConfig, ToolDefinition};
}
