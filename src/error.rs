//! Proxy error kinds and error value helpers.
//!
//! ```rust
//! use chatproxy::{ProxyError, ProxyErrorKind};
//!
//! let config = ProxyError::config("missing endpoint");
//! assert_eq!(config.kind, ProxyErrorKind::Config);
//! assert!(config.status.is_none());
//!
//! let status = ProxyError::http_status(500, "upstream exploded");
//! assert_eq!(status.status, Some(500));
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyErrorKind {
    Config,
    Transport,
    HttpStatus,
    Parse,
    MalformedResponse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyError {
    pub kind: ProxyErrorKind,
    pub message: String,
    pub status: Option<u16>,
}

impl ProxyError {
    pub fn new(kind: ProxyErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ProxyErrorKind::Config, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProxyErrorKind::Transport, message)
    }

    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ProxyErrorKind::HttpStatus,
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ProxyErrorKind::Parse, message)
    }

    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self::new(ProxyErrorKind::MalformedResponse, message)
    }
}

impl Display for ProxyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{:?} ({status}): {}", self.kind, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ProxyError {}
