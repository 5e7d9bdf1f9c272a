//! Wire request assembly from resolved options and call arguments.

use serde::Serialize;
use serde_json::Value;

use crate::{ResolvedOptions, WireMessage};

/// One outgoing chat-completions payload. Built once per call, immutable
/// after construction, consumed by exactly one transport call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

/// Tools are declared, with automatic tool selection, only when the tool
/// list is non-empty. Mandatory-field validation happens at the transport
/// boundary, not here.
pub fn build_chat_request(
    options: &ResolvedOptions,
    messages: Vec<WireMessage>,
    tools: &[Value],
    stream: bool,
) -> ChatRequest {
    let (tools, tool_choice) = if tools.is_empty() {
        (None, None)
    } else {
        (Some(tools.to_vec()), Some("auto".to_string()))
    };

    ChatRequest {
        model: options.model.clone(),
        messages,
        temperature: options.temperature,
        max_tokens: options.max_tokens,
        tools,
        tool_choice,
        stream,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn options() -> ResolvedOptions {
        ResolvedOptions {
            model: "test-model".to_string(),
            apikey: Some("key".to_string()),
            endpoint: Some("https://proxy.test/chat".to_string()),
            temperature: 0.3,
            max_tokens: 64,
        }
    }

    #[test]
    fn buffered_request_omits_tools_and_stream_keys() {
        let request = build_chat_request(
            &options(),
            vec![WireMessage::plain("user", "hi")],
            &[],
            false,
        );

        let serialized = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            serialized,
            json!({
                "model": "test-model",
                "messages": [{"role": "user", "content": "hi"}],
                "temperature": 0.3,
                "max_tokens": 64,
            })
        );
    }

    #[test]
    fn tools_come_with_automatic_tool_choice() {
        let tool = json!({"type": "function", "function": {"name": "lookup"}});
        let request = build_chat_request(&options(), Vec::new(), &[tool.clone()], false);

        assert_eq!(request.tools, Some(vec![tool]));
        assert_eq!(request.tool_choice.as_deref(), Some("auto"));
    }

    #[test]
    fn streaming_request_serializes_the_stream_flag() {
        let request = build_chat_request(&options(), Vec::new(), &[], true);
        let serialized = serde_json::to_value(&request).expect("serialize");
        assert_eq!(serialized.get("stream"), Some(&json!(true)));
    }
}
