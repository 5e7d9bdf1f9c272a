//! Server-sent-event frame reconstruction and typed stream events.
//!
//! ```rust
//! use chatproxy::{SseFrameParser, StreamEvent};
//!
//! let mut parser = SseFrameParser::new();
//! assert!(parser.consume(b"data: [DO").is_empty());
//! assert_eq!(parser.consume(b"NE]\n"), vec![StreamEvent::Done]);
//! ```

use serde_json::{Map, Value};

pub const DONE_SENTINEL: &str = "[DONE]";
const DATA_PREFIX: &str = "data:";

/// Typed event decoded from one `data:` frame. Produced only during
/// streaming, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Incremental assistant text; callers concatenate deltas to rebuild the
    /// full message.
    Delta(String),
    /// A choice carried a non-null finish reason; `raw` is the whole decoded
    /// frame for callers that need more than the reason.
    Meta { finish_reason: String, raw: Value },
    /// Incremental tool-call fragments from `choices[0].delta.tool_calls`.
    ToolCallDelta(Vec<Value>),
    /// The `[DONE]` sentinel. Informational; the connection close ends the
    /// stream, not this event.
    Done,
}

/// Reassembles SSE `data:` frames from arbitrarily-split byte chunks.
///
/// The transport below delivers chunks at socket-buffer boundaries, so a
/// chunk may end mid-line, mid-JSON-object, or mid-UTF-8-sequence. The
/// parser keeps the trailing partial line in a carry-over buffer; feeding
/// the same stream in one chunk or split at every byte yields the same
/// event sequence.
///
/// Each in-flight stream call owns exactly one parser; there is no state
/// shared across calls.
#[derive(Debug, Default)]
pub struct SseFrameParser {
    buffer: Vec<u8>,
}

impl SseFrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns every event completed by it, in wire
    /// order.
    pub fn consume(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            // Complete lines never split a UTF-8 sequence, so lossy decoding
            // only mangles input that was invalid on the wire.
            let line = String::from_utf8_lossy(&line);
            parse_line(line.trim(), &mut events);
        }

        events
    }
}

fn parse_line(line: &str, events: &mut Vec<StreamEvent>) {
    if line.is_empty() || !line.starts_with(DATA_PREFIX) {
        return;
    }

    let payload = line[DATA_PREFIX.len()..].trim();
    if payload == DONE_SENTINEL {
        events.push(StreamEvent::Done);
        return;
    }

    // Keep-alive and comment noise decodes as garbage; skip it without
    // aborting the stream.
    let Ok(frame) = serde_json::from_str::<Value>(payload) else {
        return;
    };

    if !frame.is_object() {
        return;
    }

    let choice = frame
        .get("choices")
        .and_then(|choices| choices.get(0))
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));

    if let Some(finish_reason) = choice.get("finish_reason").and_then(Value::as_str) {
        events.push(StreamEvent::Meta {
            finish_reason: finish_reason.to_string(),
            raw: frame.clone(),
        });
    }

    let delta = choice
        .get("delta")
        .and_then(|delta| delta.get("content"))
        .and_then(Value::as_str)
        .or_else(|| {
            choice
                .get("delta")
                .and_then(|delta| delta.get("text"))
                .and_then(Value::as_str)
        })
        .or_else(|| {
            frame
                .get("delta")
                .and_then(|delta| delta.get("content"))
                .and_then(Value::as_str)
        });

    if let Some(delta) = delta
        && !delta.is_empty()
    {
        events.push(StreamEvent::Delta(delta.to_string()));
    }

    if let Some(tool_calls) = choice
        .get("delta")
        .and_then(|delta| delta.get("tool_calls"))
        .and_then(Value::as_array)
        && !tool_calls.is_empty()
    {
        events.push(StreamEvent::ToolCallDelta(tool_calls.clone()));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn consume_all(parser: &mut SseFrameParser, chunks: &[&[u8]]) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        for chunk in chunks {
            events.extend(parser.consume(chunk));
        }
        events
    }

    #[test]
    fn done_sentinel_yields_exactly_one_done_and_never_a_delta() {
        let mut parser = SseFrameParser::new();
        let events = parser.consume(b"data: [DONE]\n");
        assert_eq!(events, vec![StreamEvent::Done]);
    }

    #[test]
    fn blank_lines_comments_and_non_json_frames_are_skipped() {
        let mut parser = SseFrameParser::new();
        let events = parser.consume(b"\n: keep-alive\nevent: ping\ndata: not json\ndata: 42\n");
        assert!(events.is_empty());
    }

    #[test]
    fn delta_fallback_order_covers_all_known_shapes() {
        let mut parser = SseFrameParser::new();

        let events = consume_all(
            &mut parser,
            &[
                b"data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n",
                b"data: {\"choices\":[{\"delta\":{\"text\":\"b\"}}]}\n",
                b"data: {\"delta\":{\"content\":\"c\"}}\n",
                b"data: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n",
            ],
        );

        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("a".to_string()),
                StreamEvent::Delta("b".to_string()),
                StreamEvent::Delta("c".to_string()),
            ]
        );
    }

    #[test]
    fn finish_reason_emits_meta_before_the_delta_of_the_same_frame() {
        let frame = json!({
            "choices": [{"delta": {"content": "tail"}, "finish_reason": "stop"}],
        });
        let line = format!("data: {frame}\n");

        let mut parser = SseFrameParser::new();
        let events = parser.consume(line.as_bytes());

        assert_eq!(
            events,
            vec![
                StreamEvent::Meta {
                    finish_reason: "stop".to_string(),
                    raw: frame,
                },
                StreamEvent::Delta("tail".to_string()),
            ]
        );
    }

    #[test]
    fn tool_call_deltas_are_surfaced_as_their_own_event() {
        let mut parser = SseFrameParser::new();
        let events = parser.consume(
            b"data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"c1\"}]}}]}\n",
        );

        assert_eq!(
            events,
            vec![StreamEvent::ToolCallDelta(vec![
                json!({"index": 0, "id": "c1"}),
            ])]
        );
    }

    #[test]
    fn chunk_boundaries_do_not_change_the_event_sequence() {
        let wire = b"data: {\"choices\":[{\"delta\":{\"content\":\"h\\u00e9llo \"}}]}\n\
            \n\
            data: {\"choices\":[{\"delta\":{\"content\":\"w\xc3\xb6rld\"}}]}\r\n\
            data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\
            data: [DONE]\n";

        let whole = SseFrameParser::new().consume(wire);

        let mut per_byte_parser = SseFrameParser::new();
        let mut per_byte = Vec::new();
        for byte in wire.iter() {
            per_byte.extend(per_byte_parser.consume(std::slice::from_ref(byte)));
        }

        let mut offset_parser = SseFrameParser::new();
        let mut offsets = Vec::new();
        for chunk in wire.chunks(7) {
            offsets.extend(offset_parser.consume(chunk));
        }

        assert_eq!(whole.len(), 4);
        assert_eq!(whole[0], StreamEvent::Delta("héllo ".to_string()));
        assert_eq!(whole[1], StreamEvent::Delta("wörld".to_string()));
        assert!(matches!(whole[2], StreamEvent::Meta { .. }));
        assert_eq!(whole[3], StreamEvent::Done);
        assert_eq!(per_byte, whole);
        assert_eq!(offsets, whole);
    }

    #[test]
    fn trailing_bytes_without_a_newline_stay_buffered() {
        let mut parser = SseFrameParser::new();
        assert!(parser.consume(b"data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}").is_empty());
        assert_eq!(
            parser.consume(b"\n"),
            vec![StreamEvent::Delta("x".to_string())]
        );
    }
}
