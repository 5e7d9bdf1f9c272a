//! Normalization of loosely-typed message records into the strict wire shape.
//!
//! Critical invariant: a `tool` message is transmittable only if a preceding
//! assistant message in the same outgoing list declared a matching
//! `tool_call_id`, and each declared id satisfies at most one tool response.
//! Orphaned tool replies would make an OpenAI-compatible backend reject the
//! whole request, so they are dropped instead.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl WireMessage {
    pub fn plain(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireToolCall {
    pub id: String,
    pub r#type: String,
    pub function: WireFunction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireFunction {
    pub name: String,
    pub arguments: String,
}

/// Normalizes caller-supplied records in order. Total and defensive: bad
/// input degrades to omission or coercion, never to an error.
pub fn normalize_messages(messages: &[Value]) -> Vec<WireMessage> {
    let mut out = Vec::new();
    let mut valid_tool_call_ids = HashSet::new();

    for record in messages {
        // Records without a role are malformed input, filtered silently.
        let Some(role) = record.get("role").and_then(Value::as_str) else {
            continue;
        };

        let content = coerce_content(record.get("content"));

        if role == "assistant"
            && let Some(calls) = record
                .get("tool_calls")
                .and_then(Value::as_array)
                .filter(|calls| !calls.is_empty())
        {
            let mut tool_calls = Vec::new();
            for call in calls {
                if let Some(wire_call) = reshape_tool_call(call) {
                    valid_tool_call_ids.insert(wire_call.id.clone());
                    tool_calls.push(wire_call);
                }
            }

            out.push(WireMessage {
                role: role.to_string(),
                content,
                tool_calls: Some(tool_calls),
                tool_call_id: None,
            });
            push_feedback(&mut out, record);
            continue;
        }

        if role == "tool" {
            let tool_call_id = record
                .get("tool_call_id")
                .and_then(Value::as_str)
                .unwrap_or("");

            // remove() makes each declared id one-shot: a duplicate tool
            // reply to the same call is dropped like an orphan.
            if tool_call_id.is_empty() || !valid_tool_call_ids.remove(tool_call_id) {
                continue;
            }

            out.push(WireMessage {
                role: role.to_string(),
                content,
                tool_calls: None,
                tool_call_id: Some(tool_call_id.to_string()),
            });
            push_feedback(&mut out, record);
            continue;
        }

        out.push(WireMessage::plain(role, content));
        push_feedback(&mut out, record);
    }

    out
}

fn coerce_content(content: Option<&Value>) -> String {
    match content {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn reshape_tool_call(call: &Value) -> Option<WireToolCall> {
    let id = string_like(call.get("id")?)?;
    let function = call.get("function")?;
    let name = string_like(function.get("name")?)?;

    let arguments = match function.get("arguments") {
        None | Some(Value::Null) => "{}".to_string(),
        Some(Value::String(arguments)) => arguments.clone(),
        Some(other) => serde_json::to_string(other).unwrap_or_else(|_| "{}".to_string()),
    };

    Some(WireToolCall {
        id,
        r#type: "function".to_string(),
        function: WireFunction { name, arguments },
    })
}

fn push_feedback(out: &mut Vec<WireMessage>, record: &Value) {
    let Some(feedback) = record.get("feedback").and_then(Value::as_str) else {
        return;
    };

    let feedback = feedback.trim();
    if !feedback.is_empty() {
        out.push(WireMessage::plain("user", feedback));
    }
}

fn string_like(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
