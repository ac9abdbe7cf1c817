use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{future, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;

use crate::config::ModelConfig;
use crate::error::AppError;
use crate::llm::provider::{
    ChatMessage, DeltaChunk, DeltaStream, FinishReason, ModelBackend, ToolCallDelta,
};
use crate::tools::definition::ToolDefinition;

pub struct OpenAICompatibleBackend {
    client: reqwest::Client,
    model: String,
    base_url: String,
}

impl OpenAICompatibleBackend {
    pub fn new(config: ModelConfig) -> Result<Self, AppError> {
        let base_url = normalize_base_url(config.base_url);
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|e| AppError::Message(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Message(e.to_string()))?;

        Ok(Self {
            client,
            model: config.model_id,
            base_url,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ModelBackend for OpenAICompatibleBackend {
    async fn stream_turn(
        &self,
        messages: Vec<ChatMessage>,
        tools: &[ToolDefinition],
    ) -> Result<DeltaStream, AppError> {
        let tool_defs = tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters
                    }
                })
            })
            .collect::<Vec<_>>();

        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "tools": tool_defs,
            "tool_choice": "auto",
            "stream": true
        });

        let resp = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_else(|_| "".to_string());
            return Err(AppError::Transport(format!(
                "Chat backend error: {status} {text}"
            )));
        }

        let stream = resp
            .bytes_stream()
            .eventsource()
            .take_while(|event| {
                let done = matches!(event, Ok(e) if e.data == "[DONE]");
                future::ready(!done)
            })
            .map(|event| match event {
                Ok(e) => parse_chunk(&e.data),
                Err(e) => Err(AppError::Transport(e.to_string())),
            });

        Ok(Box::pin(stream))
    }
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<StreamToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
struct StreamToolCallDelta {
    index: usize,
    id: Option<String>,
    function: Option<StreamFunctionDelta>,
}

#[derive(Debug, Default, Deserialize)]
struct StreamFunctionDelta {
    name: Option<String>,
    arguments: Option<String>,
}

fn parse_chunk(data: &str) -> Result<DeltaChunk, AppError> {
    let chunk: StreamChunk = serde_json::from_str(data)
        .map_err(|e| AppError::Transport(format!("Malformed stream chunk: {e}")))?;

    let mut out = DeltaChunk::default();
    if let Some(choice) = chunk.choices.into_iter().next() {
        out.text = choice.delta.content.filter(|t| !t.is_empty());
        for tc in choice.delta.tool_calls.unwrap_or_default() {
            let function = tc.function.unwrap_or_default();
            out.tool_calls.push(ToolCallDelta {
                index: tc.index,
                id: tc.id,
                name: function.name,
                arguments: function.arguments,
            });
        }
        out.finish = choice.finish_reason.as_deref().map(|reason| match reason {
            "tool_calls" => FinishReason::ToolCalls,
            _ => FinishReason::Stop,
        });
    }
    Ok(out)
}

pub fn normalize_base_url(base_url: Option<String>) -> String {
    let default_url = "https://api.openai.com/v1".to_string();
    let Some(mut base) = base_url else {
        return default_url;
    };
    base = base.trim().to_string();
    if base.is_empty() {
        return default_url;
    }

    // Users sometimes paste the full endpoint.
    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        base = trimmed
            .strip_suffix("/chat/completions")
            .unwrap_or(trimmed)
            .to_string();
    }

    // Only append /v1 when no path is provided.
    match url::Url::parse(&base) {
        Ok(url) => {
            let path = url.path();
            if path.is_empty() || path == "/" {
                return format!("{}/v1", base.trim_end_matches('/'));
            }
            base.trim_end_matches('/').to_string()
        }
        Err(_) => base.trim_end_matches('/').to_string(),
    }
}
