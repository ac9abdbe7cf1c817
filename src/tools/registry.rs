use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppError;
use crate::tools::chart_data::ChartDataTool;
use crate::tools::definition::ToolDefinition;

/// A capability the model may invoke. Implementations may suspend (e.g. call
/// an external service); the executor awaits completion before emitting the
/// matching result event.
#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;
    async fn execute(&self, arguments: Value) -> Result<Value, AppError>;
}

/// Read-only name → implementation map, shared across conversations.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<(String, Arc<dyn Tool>)>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin_tools() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ChartDataTool));
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push((tool.definition().name, tool));
    }

    /// Tool schemas in registration order, supplied to the model every round.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|(_, tool)| tool.definition()).collect()
    }

    pub async fn execute(&self, name: &str, arguments: Value) -> Result<Value, AppError> {
        let tool = self
            .tools
            .iter()
            .find(|(tool_name, _)| tool_name == name)
            .map(|(_, tool)| tool)
            .ok_or_else(|| AppError::UnknownTool(name.to_string()))?;
        tool.execute(arguments).await
    }
}
