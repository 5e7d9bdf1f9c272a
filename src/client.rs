//! Caller-facing proxy client: configuration, buffered chat, and SSE
//! streaming.

use std::pin::Pin;
use std::sync::Arc;

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use serde_json::Value;

use crate::transport::truncate;
use crate::{
    ConfigValueResolver, NoopOperationHooks, OptionsPatch, ProxyError, ProxyHttpRequest,
    ProxyOperationHooks, ProxyTransport, ResolvedOptions, SseFrameParser, StreamEvent,
    build_chat_request, normalize_messages,
};

pub type EventStream<'a> = Pin<Box<dyn Stream<Item = Result<StreamEvent, ProxyError>> + Send + 'a>>;

/// Client for one OpenAI-compatible chat-completion proxy.
///
/// Each call builds its own payload, parser buffer, and tool-call-id set, so
/// concurrent calls on clones of a client never interfere. Mutating the
/// resolved-options cache takes `&mut self`; reads take `&self`.
pub struct ProxyClient {
    resolver: Arc<dyn ConfigValueResolver>,
    transport: Arc<dyn ProxyTransport>,
    hooks: Arc<dyn ProxyOperationHooks>,
    options: ResolvedOptions,
}

impl ProxyClient {
    pub fn new(resolver: Arc<dyn ConfigValueResolver>, transport: Arc<dyn ProxyTransport>) -> Self {
        Self {
            resolver,
            transport,
            hooks: Arc::new(NoopOperationHooks),
            options: ResolvedOptions::default(),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ProxyOperationHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Re-resolves every raw config entry; previously resolved state is
    /// replaced wholesale.
    pub fn set_config(&mut self, config: &Value) {
        self.options = ResolvedOptions::from_config(self.resolver.as_ref(), config);
    }

    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    pub fn set_options(&mut self, patch: OptionsPatch) {
        self.options.apply(patch);
    }

    /// Buffered call returning the decoded JSON response body.
    pub async fn raw(&self, messages: &[Value], tools: &[Value]) -> Result<Value, ProxyError> {
        let (endpoint, apikey) = match self.preflight() {
            Ok(pair) => pair,
            Err(error) => {
                self.hooks.on_failure("raw", &error);
                return Err(error);
            }
        };

        self.hooks.on_request_start("raw", &endpoint);
        let request = self.wire_request(endpoint, apikey, messages, tools, false);

        let result = match self.transport.execute(request).await {
            Ok(body) => decode_object(&body),
            Err(error) => Err(error),
        };

        match &result {
            Ok(_) => self.hooks.on_success("raw"),
            Err(error) => self.hooks.on_failure("raw", error),
        }

        result
    }

    /// Buffered call returning assistant text, extracted with the fallback
    /// chain `choices[0].message.content`, `message.content`, `content`.
    pub async fn chat(&self, messages: &[Value]) -> Result<String, ProxyError> {
        let decoded = self.raw(messages, &[]).await?;

        match extract_assistant_text(&decoded) {
            Ok(text) => Ok(text),
            Err(error) => {
                self.hooks.on_failure("chat", &error);
                Err(error)
            }
        }
    }

    /// Streaming call yielding typed events in wire arrival order.
    ///
    /// Dropping the returned stream aborts the in-flight exchange; that is
    /// the cancellation surface for a stuck stream.
    pub async fn stream_events(
        &self,
        messages: &[Value],
        tools: &[Value],
    ) -> Result<EventStream<'_>, ProxyError> {
        let (endpoint, apikey) = match self.preflight() {
            Ok(pair) => pair,
            Err(error) => {
                self.hooks.on_failure("stream", &error);
                return Err(error);
            }
        };

        self.hooks.on_request_start("stream", &endpoint);
        let request = self.wire_request(endpoint, apikey, messages, tools, true);

        let mut chunks = match self.transport.execute_stream(request).await {
            Ok(chunks) => chunks,
            Err(error) => {
                self.hooks.on_failure("stream", &error);
                return Err(error);
            }
        };

        let hooks = Arc::clone(&self.hooks);
        let stream = try_stream! {
            let mut parser = SseFrameParser::new();
            while let Some(chunk) = chunks.next().await {
                match chunk {
                    Ok(bytes) => {
                        for event in parser.consume(&bytes) {
                            yield event;
                        }
                    }
                    Err(error) => {
                        hooks.on_failure("stream", &error);
                        Err(error)?;
                    }
                }
            }
            hooks.on_success("stream");
        };

        Ok(Box::pin(stream))
    }

    /// Callback adapter over [`ProxyClient::stream_events`]: `on_data` gets
    /// every text delta, `on_meta` (when provided) gets `Meta`,
    /// `ToolCallDelta`, and `Done` events, synchronously and in order.
    pub async fn stream<D, M>(
        &self,
        messages: &[Value],
        tools: &[Value],
        mut on_data: D,
        mut on_meta: Option<M>,
    ) -> Result<(), ProxyError>
    where
        D: FnMut(&str),
        M: FnMut(&StreamEvent),
    {
        let mut events = self.stream_events(messages, tools).await?;

        while let Some(event) = events.next().await {
            match event? {
                StreamEvent::Delta(delta) => on_data(&delta),
                event => {
                    if let Some(on_meta) = on_meta.as_mut() {
                        on_meta(&event);
                    }
                }
            }
        }

        Ok(())
    }

    fn preflight(&self) -> Result<(String, String), ProxyError> {
        let apikey = match &self.options.apikey {
            Some(apikey) if !apikey.is_empty() => apikey.clone(),
            _ => return Err(ProxyError::config("missing API key for chat proxy")),
        };

        let endpoint = match &self.options.endpoint {
            Some(endpoint) if !endpoint.is_empty() => endpoint.clone(),
            _ => return Err(ProxyError::config("missing endpoint for chat proxy")),
        };

        Ok((endpoint, apikey))
    }

    fn wire_request(
        &self,
        endpoint: String,
        apikey: String,
        messages: &[Value],
        tools: &[Value],
        stream: bool,
    ) -> ProxyHttpRequest {
        let normalized = normalize_messages(messages);
        ProxyHttpRequest {
            endpoint,
            apikey,
            payload: build_chat_request(&self.options, normalized, tools, stream),
        }
    }
}

fn decode_object(body: &str) -> Result<Value, ProxyError> {
    let decoded = serde_json::from_str::<Value>(body).map_err(|_| {
        ProxyError::parse(format!(
            "invalid JSON response from proxy: {}",
            truncate(body, 200)
        ))
    })?;

    if !decoded.is_object() {
        return Err(ProxyError::parse(format!(
            "proxy response is not a JSON object: {}",
            truncate(body, 200)
        )));
    }

    Ok(decoded)
}

fn extract_assistant_text(decoded: &Value) -> Result<String, ProxyError> {
    let candidates = [
        decoded
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content")),
        decoded.get("message").and_then(|message| message.get("content")),
        decoded.get("content"),
    ];

    for candidate in candidates.into_iter().flatten() {
        if let Some(text) = candidate.as_str()
            && !text.is_empty()
        {
            return Ok(text.to_string());
        }
    }

    // Carry the decoded body so callers can see what shape the proxy
    // actually produced.
    Err(ProxyError::malformed_response(format!(
        "malformed proxy chat response: {decoded}"
    )))
}
