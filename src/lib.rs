//! Client for an OpenAI-compatible chat-completion proxy, in buffered and
//! SSE-streamed forms.
//!
//! The client normalizes loosely-typed conversation histories into the
//! strict wire shape, assembles one immutable payload per call, and talks to
//! the proxy through a swappable transport seam. Streamed responses are
//! reassembled from arbitrarily-split byte chunks into typed events.

mod client;
mod config;
mod error;
mod hooks;
mod normalize;
mod request;
mod sse;
mod transport;

pub mod prelude {
    pub use crate::{
        ChatRequest, ChunkStream, ConfigValueResolver, EventStream, HttpProxyTransport,
        IdentityResolver, NoopOperationHooks, OptionsPatch, ProxyClient, ProxyError,
        ProxyErrorKind, ProxyFuture, ProxyHttpRequest, ProxyOperationHooks, ProxyTransport,
        ResolvedOptions, SseFrameParser, StreamEvent, TracingOperationHooks, WireMessage,
        WireToolCall,
    };
}

pub use client::{EventStream, ProxyClient};
pub use config::{
    ConfigValueResolver, DEFAULT_ENDPOINT, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
    IdentityResolver, OptionsPatch, ResolvedOptions,
};
pub use error::{ProxyError, ProxyErrorKind};
pub use hooks::{NoopOperationHooks, ProxyOperationHooks, TracingOperationHooks};
pub use normalize::{WireFunction, WireMessage, WireToolCall, normalize_messages};
pub use request::{ChatRequest, build_chat_request};
pub use sse::{DONE_SENTINEL, SseFrameParser, StreamEvent};
pub use transport::{
    ChunkStream, DEFAULT_AUTH_HEADER, HttpProxyTransport, ProxyFuture, ProxyHttpRequest,
    ProxyTransport,
};
