//! Tool Registry - Central registration and discovery for tools
//!
//! The registry maps tool names to implementations and hands out an
//! executor that the protocol layer dispatches invocations through.

use gcpmcp_core::{GcpError, GcpResult, Tool, ToolDefinition, ToolExecutor, ToolInput, ToolResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Tool registry for managing available tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> &mut Self {
        let name = tool.config().name.clone();
        info!(tool = %name, "Registering tool");
        self.tools.insert(name, Arc::new(tool));
        self
    }

    /// Register a batch of boxed tools, e.g. `FunctionsTools::all(..)`
    pub fn register_all(&mut self, tools: Vec<Box<dyn Tool>>) -> &mut Self {
        for tool in tools {
            let name = tool.config().name.clone();
            debug!(tool = %name, "Registering tool");
            self.tools.insert(name, Arc::from(tool));
        }
        self
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all tool names, sorted
    pub fn list_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// List tool definitions, sorted by name
    pub fn list_definitions(&self) -> Vec<ToolDefinition> {
        sorted_definitions(&self.tools)
    }

    /// Get tool count
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Convert registry into a tool executor
    pub fn into_executor(self) -> BuiltinToolExecutor {
        BuiltinToolExecutor::new(self)
    }
}

fn sorted_definitions(tools: &HashMap<String, Arc<dyn Tool>>) -> Vec<ToolDefinition> {
    let mut definitions: Vec<ToolDefinition> = tools.values().map(|t| t.definition()).collect();
    definitions.sort_by(|a, b| a.name.cmp(&b.name));
    definitions
}

/// Built-in tool executor that wraps the registry
pub struct BuiltinToolExecutor {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl BuiltinToolExecutor {
    /// Create from registry
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            tools: registry.tools,
        }
    }
}

#[async_trait]
impl ToolExecutor for BuiltinToolExecutor {
    async fn execute_tool(&self, name: &str, input: ToolInput) -> GcpResult<ToolResult> {
        let tool = self.tools.get(name).ok_or_else(|| {
            GcpError::tool(format!("Tool not found: {}", name))
        })?;

        debug!(tool = %name, "Executing tool");
        let start = std::time::Instant::now();

        match tool.execute(input).await {
            Ok(result) => {
                let elapsed = start.elapsed().as_millis() as u64;
                debug!(tool = %name, elapsed_ms = %elapsed, success = %result.success, "Tool execution complete");
                Ok(result.with_execution_time(elapsed))
            }
            Err(e) => {
                warn!(tool = %name, error_kind = e.kind(), error = %e, "Tool execution failed");
                Err(e)
            }
        }
    }

    fn list_tools(&self) -> Vec<ToolDefinition> {
        sorted_definitions(&self.tools)
    }

    fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }
}
