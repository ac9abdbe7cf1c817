use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The wire contract emitted to the client, one event per line. Consumers
/// must treat the stream as an ordered sequence, not a set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StreamEvent {
    MessageDelta { data: String },
    FunctionCall { data: FunctionCallData },
    FunctionResult { data: FunctionResultData },
    Done,
    Error { data: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallData {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResultData {
    pub tool_call_id: String,
    pub result: Value,
}

impl StreamEvent {
    pub fn message_delta(text: impl Into<String>) -> Self {
        StreamEvent::MessageDelta { data: text.into() }
    }

    pub fn function_call(id: String, name: String, arguments: Value) -> Self {
        StreamEvent::FunctionCall {
            data: FunctionCallData { id, name, arguments },
        }
    }

    pub fn function_result(tool_call_id: String, result: Value) -> Self {
        StreamEvent::FunctionResult {
            data: FunctionResultData { tool_call_id, result },
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        StreamEvent::Error { data: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_serialize_to_tagged_compact_json() {
        assert_eq!(
            serde_json::to_string(&StreamEvent::message_delta("Hi")).unwrap(),
            r#"{"type":"message-delta","data":"Hi"}"#
        );
        assert_eq!(
            serde_json::to_string(&StreamEvent::Done).unwrap(),
            r#"{"type":"done"}"#
        );
        assert_eq!(
            serde_json::to_string(&StreamEvent::error("boom")).unwrap(),
            r#"{"type":"error","data":"boom"}"#
        );
    }

    #[test]
    fn function_events_carry_structured_data() {
        let call = StreamEvent::function_call(
            "call_1".to_string(),
            "getChartData".to_string(),
            json!({"chartId": "top-products"}),
        );
        assert_eq!(
            serde_json::to_string(&call).unwrap(),
            r#"{"type":"function-call","data":{"id":"call_1","name":"getChartData","arguments":{"chartId":"top-products"}}}"#
        );

        let result = StreamEvent::function_result("call_1".to_string(), json!({"total": 42}));
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"type":"function-result","data":{"tool_call_id":"call_1","result":{"total":42}}}"#
        );
    }
}
