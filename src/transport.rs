//! HTTP transport seam for the proxy wire protocol.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use crate::{ChatRequest, ProxyError};

pub type ProxyFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub type ChunkStream<'a> = Pin<Box<dyn Stream<Item = Result<Bytes, ProxyError>> + Send + 'a>>;

pub const DEFAULT_AUTH_HEADER: &str = "X-Proxy-Token";

const STATUS_SNIPPET_LIMIT: usize = 200;

/// One fully-assembled outbound exchange: endpoint and credential are
/// validated by the client before this is constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyHttpRequest {
    pub endpoint: String,
    pub apikey: String,
    pub payload: ChatRequest,
}

/// Issues exactly one POST per call; retries never happen at this layer or
/// above it.
pub trait ProxyTransport: Send + Sync {
    /// Buffered exchange: status checked once headers and body are in,
    /// undecoded body text returned on success.
    fn execute<'a>(
        &'a self,
        request: ProxyHttpRequest,
    ) -> ProxyFuture<'a, Result<String, ProxyError>>;

    /// Streaming exchange: status checked once headers are in, then the body
    /// is handed over as raw byte chunks at arbitrary boundaries.
    fn execute_stream<'a>(
        &'a self,
        request: ProxyHttpRequest,
    ) -> ProxyFuture<'a, Result<ChunkStream<'a>, ProxyError>>;
}

#[derive(Debug, Clone)]
pub struct HttpProxyTransport {
    client: Client,
    auth_header: String,
}

impl HttpProxyTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            auth_header: DEFAULT_AUTH_HEADER.to_string(),
        }
    }

    pub fn with_auth_header(mut self, name: impl Into<String>) -> Self {
        self.auth_header = name.into();
        self
    }

    fn builder(&self, request: &ProxyHttpRequest) -> reqwest::RequestBuilder {
        self.client
            .post(&request.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(self.auth_header.as_str(), &request.apikey)
            .json(&request.payload)
    }
}

impl ProxyTransport for HttpProxyTransport {
    fn execute<'a>(
        &'a self,
        request: ProxyHttpRequest,
    ) -> ProxyFuture<'a, Result<String, ProxyError>> {
        Box::pin(async move {
            let response = self
                .builder(&request)
                .send()
                .await
                .map_err(|err| ProxyError::transport(err.to_string()))?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|err| ProxyError::transport(err.to_string()))?;

            if !status.is_success() {
                return Err(ProxyError::http_status(
                    status.as_u16(),
                    truncate(&body, STATUS_SNIPPET_LIMIT),
                ));
            }

            Ok(body)
        })
    }

    fn execute_stream<'a>(
        &'a self,
        request: ProxyHttpRequest,
    ) -> ProxyFuture<'a, Result<ChunkStream<'a>, ProxyError>> {
        Box::pin(async move {
            let response = self
                .builder(&request)
                .header(ACCEPT, "text/event-stream")
                .send()
                .await
                .map_err(|err| ProxyError::transport(err.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ProxyError::http_status(
                    status.as_u16(),
                    truncate(&body, STATUS_SNIPPET_LIMIT),
                ));
            }

            let chunks = response
                .bytes_stream()
                .map(|item| item.map_err(|err| ProxyError::transport(err.to_string())));

            Ok(Box::pin(chunks) as ChunkStream<'a>)
        })
    }
}

pub(crate) fn truncate(input: &str, max: usize) -> String {
    if input.len() <= max {
        return input.to_string();
    }

    let mut end = max;
    while !input.is_char_boundary(end) {
        end -= 1;
    }

    let mut output = input[..end].to_string();
    output.push_str("...");
    output
}
