use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON-schema-typed parameters, passed through to the model verbatim.
    #[serde(default)]
    pub parameters: Value,
}
