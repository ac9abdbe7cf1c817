use std::collections::BTreeMap;

use crate::llm::provider::ToolCallDelta;

/// A fully reassembled tool call, ready to parse and execute.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments_json: String,
}

/// Per-turn scratch state that reassembles fragmented tool-call deltas keyed
/// by the backend's position index. Scoped to exactly one turn; the executor
/// consumes it at finalization.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    entries: BTreeMap<usize, PartialCall>,
}

#[derive(Debug, Default)]
struct PartialCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn absorb(&mut self, delta: &ToolCallDelta) {
        let entry = self.entries.entry(delta.index).or_default();
        // Latch the id on first non-empty value; some backends echo it again
        // in later chunks.
        if entry.id.is_none() {
            if let Some(id) = delta.id.as_deref() {
                if !id.is_empty() {
                    entry.id = Some(id.to_string());
                }
            }
        }
        if let Some(name) = delta.name.as_deref() {
            entry.name.push_str(name);
        }
        if let Some(arguments) = delta.arguments.as_deref() {
            entry.arguments.push_str(arguments);
        }
    }

    /// Consume the accumulator, yielding requests ordered by ascending index.
    /// Index, not arrival order, is the backend's authoritative call-position
    /// signal.
    pub fn finalize(self) -> Vec<ToolCallRequest> {
        self.entries
            .into_values()
            .map(|partial| ToolCallRequest {
                id: partial.id.unwrap_or_else(synthesize_call_id),
                name: partial.name,
                arguments_json: partial.arguments,
            })
            .collect()
    }
}

fn synthesize_call_id() -> String {
    format!("call_{}", chrono::Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(index: usize, id: Option<&str>, name: Option<&str>, args: Option<&str>) -> ToolCallDelta {
        ToolCallDelta {
            index,
            id: id.map(str::to_string),
            name: name.map(str::to_string),
            arguments: args.map(str::to_string),
        }
    }

    #[test]
    fn fragments_concatenate_in_arrival_order() {
        let mut acc = ToolCallAccumulator::new();
        acc.absorb(&delta(0, Some("call_a"), Some("getChart"), Some("{\"chartId\":")));
        acc.absorb(&delta(0, None, Some("Data"), Some("\"top-products\"}")));

        let calls = acc.finalize();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_a");
        assert_eq!(calls[0].name, "getChartData");
        assert_eq!(calls[0].arguments_json, r#"{"chartId":"top-products"}"#);
    }

    #[test]
    fn finalize_orders_by_index_not_arrival() {
        let mut acc = ToolCallAccumulator::new();
        acc.absorb(&delta(1, Some("call_b"), Some("second"), Some("{}")));
        acc.absorb(&delta(0, Some("call_a"), Some("first"), Some("{\"x\":")));
        acc.absorb(&delta(1, None, None, None));
        acc.absorb(&delta(0, None, None, Some("1}")));

        let calls = acc.finalize();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "first");
        assert_eq!(calls[0].arguments_json, r#"{"x":1}"#);
        assert_eq!(calls[1].name, "second");
    }

    #[test]
    fn id_latches_on_first_non_empty_value() {
        let mut acc = ToolCallAccumulator::new();
        acc.absorb(&delta(0, Some(""), Some("tool"), None));
        acc.absorb(&delta(0, Some("call_first"), None, None));
        acc.absorb(&delta(0, Some("call_second"), None, None));

        let calls = acc.finalize();
        assert_eq!(calls[0].id, "call_first");
    }

    #[test]
    fn missing_id_is_synthesized() {
        let mut acc = ToolCallAccumulator::new();
        acc.absorb(&delta(0, None, Some("tool"), Some("{}")));

        let calls = acc.finalize();
        assert!(calls[0].id.starts_with("call_"));
        assert!(calls[0].id.len() > "call_".len());
    }

    #[test]
    fn empty_accumulator_finalizes_to_nothing() {
        let acc = ToolCallAccumulator::new();
        assert!(acc.is_empty());
        assert!(acc.finalize().is_empty());
    }
}
