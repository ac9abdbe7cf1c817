#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use dashchat::error::AppError;
use dashchat::llm::provider::{
    ChatMessage, DeltaChunk, DeltaStream, FinishReason, ModelBackend, ToolCallDelta,
};
use dashchat::tools::definition::ToolDefinition;

/// A model backend that replays pre-scripted delta streams, one per turn,
/// and records the conversation it was handed on each call.
pub struct ScriptedBackend {
    turns: Mutex<VecDeque<Vec<Result<DeltaChunk, AppError>>>>,
    pub seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedBackend {
    pub fn new(turns: Vec<Vec<Result<DeltaChunk, AppError>>>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    async fn stream_turn(
        &self,
        messages: Vec<ChatMessage>,
        _tools: &[ToolDefinition],
    ) -> Result<DeltaStream, AppError> {
        self.seen.lock().unwrap().push(messages);
        let turn = self.turns.lock().unwrap().pop_front().unwrap_or_default();
        Ok(Box::pin(futures::stream::iter(turn)))
    }
}

pub fn text(fragment: &str) -> Result<DeltaChunk, AppError> {
    Ok(DeltaChunk {
        text: Some(fragment.to_string()),
        ..Default::default()
    })
}

pub fn tool_fragment(
    index: usize,
    id: Option<&str>,
    name: Option<&str>,
    arguments: Option<&str>,
) -> Result<DeltaChunk, AppError> {
    Ok(DeltaChunk {
        tool_calls: vec![ToolCallDelta {
            index,
            id: id.map(str::to_string),
            name: name.map(str::to_string),
            arguments: arguments.map(str::to_string),
        }],
        ..Default::default()
    })
}

pub fn finish(reason: FinishReason) -> Result<DeltaChunk, AppError> {
    Ok(DeltaChunk {
        finish: Some(reason),
        ..Default::default()
    })
}

pub fn transport_error(message: &str) -> Result<DeltaChunk, AppError> {
    Err(AppError::Transport(message.to_string()))
}

pub fn user(content: &str) -> ChatMessage {
    ChatMessage::User {
        content: content.to_string(),
    }
}
