// Tool registry: the server-side table of tools, their schemas and handlers

use super::schema::{Arguments, ToolDescriptor};
use crate::protocol::ToolSchema;
use salesdesk_core::storage::StoreError;
use salesdesk_core::Record;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Executes a tool once its arguments have been validated
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: Arguments) -> Result<Vec<Record>, ToolError>;
}

/// Failure raised by a tool handler
#[derive(Debug, Error)]
pub enum ToolError {
    /// Validated arguments did not fit the handler's argument type
    #[error("invalid arguments: {0}")]
    InvalidArguments(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("tool '{0}' is not registered")]
    NotFound(String),
}

struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: Arc<dyn ToolHandler>,
}

/// Tool registry, iterated in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under `descriptor.name`
    pub fn register(
        &mut self,
        descriptor: ToolDescriptor,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), RegistryError> {
        if self.index.contains_key(&descriptor.name) {
            return Err(RegistryError::DuplicateTool(descriptor.name));
        }

        tracing::debug!(tool = %descriptor.name, params = descriptor.params.len(), "Registered tool");
        self.index.insert(descriptor.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool { descriptor, handler });
        Ok(())
    }

    /// Get the handler bound to a tool name
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn ToolHandler>, RegistryError> {
        self.lookup(name).map(|tool| tool.handler.clone())
    }

    /// Get the descriptor of a tool
    pub fn describe(&self, name: &str) -> Result<&ToolDescriptor, RegistryError> {
        self.lookup(name).map(|tool| &tool.descriptor)
    }

    /// All descriptors, in registration order
    pub fn list_all(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter().map(|tool| &tool.descriptor)
    }

    /// All tool schemas for MCP, in registration order
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.list_all().map(ToolDescriptor::to_schema).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    fn lookup(&self, name: &str) -> Result<&RegisteredTool, RegistryError> {
        self.index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: serde_json::Value, required: Vec<&str>) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_integer(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "integer",
        "description": description
    })
}

pub fn json_schema_number(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "number",
        "description": description
    })
}

pub fn json_schema_boolean(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "boolean",
        "description": description
    })
}
