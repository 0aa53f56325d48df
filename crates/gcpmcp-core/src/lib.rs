// gcpmcp Core - Foundation types and traits for the gcpmcp tool server
//
// This crate holds the pieces shared by the tool implementations and the
// protocol front-end: the error taxonomy and the tool abstractions.

pub mod error;
pub mod tool;

pub use error::{GcpError, GcpResult};
pub use tool::{Tool, ToolConfig, ToolDefinition, ToolExecutor, ToolInput, ToolResult, ToolType};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
