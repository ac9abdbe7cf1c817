use futures::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::llm::provider::{ChatMessage, FinishReason, ModelBackend, ToolCallPayload};
use crate::orchestration::accumulator::{ToolCallAccumulator, ToolCallRequest};
use crate::orchestration::event::StreamEvent;
use crate::tools::registry::ToolRegistry;

/// Result of one completed turn. `tool_calls_requested` tells the
/// orchestrator whether another round is needed.
#[derive(Debug, Clone, Copy)]
pub struct TurnOutcome {
    pub tool_calls_requested: bool,
}

enum TurnState {
    Streaming,
    Finalizing(Vec<ToolCallRequest>),
    Completed(bool),
    Failed(AppError),
}

/// Drives a single model turn to completion: streams text deltas out as they
/// arrive, accumulates tool-call fragments, and executes the accumulated
/// calls once the backend reports the tool-calls finish reason.
pub struct TurnExecutor<'a> {
    backend: &'a dyn ModelBackend,
    registry: &'a ToolRegistry,
    events: &'a mpsc::Sender<StreamEvent>,
}

impl<'a> TurnExecutor<'a> {
    pub fn new(
        backend: &'a dyn ModelBackend,
        registry: &'a ToolRegistry,
        events: &'a mpsc::Sender<StreamEvent>,
    ) -> Self {
        Self {
            backend,
            registry,
            events,
        }
    }

    /// Appends any produced tool-call entries onto `conversation` so the next
    /// round sees them; the entry list is append-only during orchestration.
    pub async fn run(&self, conversation: &mut Vec<ChatMessage>) -> Result<TurnOutcome, AppError> {
        let mut state = TurnState::Streaming;
        loop {
            state = match state {
                TurnState::Streaming => self.stream_model_turn(conversation).await,
                TurnState::Finalizing(calls) => self.finalize(calls, conversation).await,
                TurnState::Completed(tool_calls_requested) => {
                    return Ok(TurnOutcome {
                        tool_calls_requested,
                    })
                }
                TurnState::Failed(error) => return Err(error),
            };
        }
    }

    async fn stream_model_turn(&self, conversation: &mut Vec<ChatMessage>) -> TurnState {
        let tools = self.registry.definitions();
        let mut stream = match self.backend.stream_turn(conversation.clone(), &tools).await {
            Ok(stream) => stream,
            Err(e) => return TurnState::Failed(e),
        };

        let mut accumulator = ToolCallAccumulator::new();
        let mut finish = None;

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => return TurnState::Failed(e),
            };
            if let Some(text) = chunk.text {
                if let Err(e) = self.send(StreamEvent::message_delta(text)).await {
                    return TurnState::Failed(e);
                }
            }
            for delta in &chunk.tool_calls {
                accumulator.absorb(delta);
            }
            if let Some(reason) = chunk.finish {
                finish = Some(reason);
            }
        }

        if finish == Some(FinishReason::ToolCalls) && !accumulator.is_empty() {
            TurnState::Finalizing(accumulator.finalize())
        } else {
            TurnState::Completed(false)
        }
    }

    async fn finalize(
        &self,
        calls: Vec<ToolCallRequest>,
        conversation: &mut Vec<ChatMessage>,
    ) -> TurnState {
        for call in calls {
            let arguments: Value = match serde_json::from_str(&call.arguments_json) {
                Ok(value) => value,
                Err(e) => {
                    // One bad call must not abort the others: report it,
                    // skip execution, keep finalizing.
                    let error = AppError::ToolArguments {
                        name: call.name.clone(),
                        message: e.to_string(),
                    };
                    tracing::warn!(tool = %call.name, "skipping tool call: {error}");
                    if let Err(e) = self.send(StreamEvent::error(error.to_string())).await {
                        return TurnState::Failed(e);
                    }
                    continue;
                }
            };

            let event =
                StreamEvent::function_call(call.id.clone(), call.name.clone(), arguments.clone());
            if let Err(e) = self.send(event).await {
                return TurnState::Failed(e);
            }

            let (result, failure) = match self.registry.execute(&call.name, arguments.clone()).await
            {
                Ok(value) => (value, None),
                Err(e) => {
                    let message = e.to_string();
                    // Record an error-shaped result so the next turn sees
                    // that this call failed rather than silently omitting it.
                    (serde_json::json!({ "error": message }), Some(message))
                }
            };

            let event = match &failure {
                None => StreamEvent::function_result(call.id.clone(), result.clone()),
                Some(message) => {
                    tracing::warn!(tool = %call.name, "tool execution failed: {message}");
                    StreamEvent::error(message.clone())
                }
            };
            if let Err(e) = self.send(event).await {
                return TurnState::Failed(e);
            }

            let serialized_args = match serde_json::to_string(&arguments) {
                Ok(s) => s,
                Err(e) => return TurnState::Failed(e.into()),
            };
            let serialized_result = match serde_json::to_string(&result) {
                Ok(s) => s,
                Err(e) => return TurnState::Failed(e.into()),
            };
            conversation.push(ChatMessage::Assistant {
                content: String::new(),
                tool_calls: Some(vec![ToolCallPayload::function(
                    call.id.clone(),
                    call.name.clone(),
                    serialized_args,
                )]),
            });
            conversation.push(ChatMessage::Tool {
                tool_call_id: call.id,
                content: serialized_result,
            });
        }

        TurnState::Completed(true)
    }

    async fn send(&self, event: StreamEvent) -> Result<(), AppError> {
        self.events
            .send(event)
            .await
            .map_err(|_| AppError::Transport("client disconnected".to_string()))
    }
}
