use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::tools::definition::ToolDefinition;

/// One entry of the conversation history. The serde representation is the
/// OpenAI-compatible wire format, so the same type covers both the client
/// request body and the payload sent to the chat backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<ToolCallPayload>>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallPayload {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionPayload {
    pub name: String,
    /// JSON-encoded arguments, kept as a string on the wire.
    pub arguments: String,
}

impl ToolCallPayload {
    pub fn function(id: String, name: String, arguments: String) -> Self {
        Self {
            id,
            kind: "function".to_string(),
            function: FunctionPayload { name, arguments },
        }
    }
}

/// An incremental fragment of one model turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeltaChunk {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCallDelta>,
    pub finish: Option<FinishReason>,
}

/// A fragment of one tool call, keyed by the backend's position index. The id
/// may arrive late or not at all; name and arguments arrive in pieces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCallDelta {
    pub index: usize,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    ToolCalls,
}

pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<DeltaChunk, AppError>> + Send>>;

#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn stream_turn(
        &self,
        messages: Vec<ChatMessage>,
        tools: &[ToolDefinition],
    ) -> Result<DeltaStream, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_round_trips_with_role_tag() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"role":"user","content":"Show top products"}"#).unwrap();
        assert_eq!(
            msg,
            ChatMessage::User {
                content: "Show top products".to_string()
            }
        );
        let out = serde_json::to_string(&msg).unwrap();
        assert_eq!(out, r#"{"role":"user","content":"Show top products"}"#);
    }

    #[test]
    fn assistant_tool_call_uses_openai_wire_shape() {
        let msg = ChatMessage::Assistant {
            content: String::new(),
            tool_calls: Some(vec![ToolCallPayload::function(
                "call_1".to_string(),
                "getChartData".to_string(),
                r#"{"chartId":"top-products"}"#.to_string(),
            )]),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["tool_calls"][0]["type"], "function");
        assert_eq!(value["tool_calls"][0]["function"]["name"], "getChartData");
        assert_eq!(
            value["tool_calls"][0]["function"]["arguments"],
            r#"{"chartId":"top-products"}"#
        );
    }

    #[test]
    fn plain_assistant_message_omits_tool_calls() {
        let msg = ChatMessage::Assistant {
            content: "hello".to_string(),
            tool_calls: None,
        };
        let out = serde_json::to_string(&msg).unwrap();
        assert_eq!(out, r#"{"role":"assistant","content":"hello"}"#);
    }

    #[test]
    fn tool_message_carries_tool_call_id() {
        let msg: ChatMessage = serde_json::from_str(
            r#"{"role":"tool","tool_call_id":"call_1","content":"{\"total\":5}"}"#,
        )
        .unwrap();
        match msg {
            ChatMessage::Tool { tool_call_id, .. } => assert_eq!(tool_call_id, "call_1"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
