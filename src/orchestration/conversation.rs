use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::AppError;
use crate::llm::provider::{ChatMessage, ModelBackend};
use crate::orchestration::event::StreamEvent;
use crate::orchestration::turn::TurnExecutor;
use crate::tools::registry::ToolRegistry;

const EVENT_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Hard cap on tool-call rounds; guarantees termination even if the
    /// model perpetually requests tool calls.
    pub max_rounds: usize,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self { max_rounds: 8 }
    }
}

/// Loops the turn executor until a turn completes with no tool calls, owning
/// the externally visible event stream. Each `run` call is an independent
/// conversation; callers hand over their own copy of the history.
pub struct ChatOrchestrator {
    backend: Arc<dyn ModelBackend>,
    registry: Arc<ToolRegistry>,
    options: OrchestratorOptions,
}

impl ChatOrchestrator {
    pub fn new(backend: Arc<dyn ModelBackend>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            backend,
            registry,
            options: OrchestratorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: OrchestratorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn run(&self, initial: Vec<ChatMessage>) -> ReceiverStream<StreamEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let backend = Arc::clone(&self.backend);
        let registry = Arc::clone(&self.registry);
        let max_rounds = self.options.max_rounds;

        tokio::spawn(async move {
            let mut conversation = initial;
            let mut round = 0usize;
            loop {
                round += 1;
                tracing::debug!(round, "starting model turn");
                let executor = TurnExecutor::new(backend.as_ref(), registry.as_ref(), &tx);
                match executor.run(&mut conversation).await {
                    Ok(outcome) if outcome.tool_calls_requested => {
                        if round >= max_rounds {
                            tracing::warn!(round, max_rounds, "tool-call round limit reached");
                            let _ = tx
                                .send(StreamEvent::error(AppError::RoundLimitExceeded.to_string()))
                                .await;
                            return;
                        }
                    }
                    Ok(_) => break,
                    Err(e) => {
                        tracing::error!(round, "chat turn failed: {e}");
                        let _ = tx.send(StreamEvent::error(e.to_string())).await;
                        return;
                    }
                }
            }
            let _ = tx.send(StreamEvent::Done).await;
        });

        ReceiverStream::new(rx)
    }
}
