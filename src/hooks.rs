//! Operation observability hooks.
//!
//! The client reports operation milestones through a hooks trait instead of
//! logging directly; callers pick the no-op impl, the tracing impl, or their
//! own.

use crate::ProxyError;

pub trait ProxyOperationHooks: Send + Sync {
    fn on_request_start(&self, _operation: &str, _endpoint: &str) {}

    fn on_success(&self, _operation: &str) {}

    fn on_failure(&self, _operation: &str, _error: &ProxyError) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOperationHooks;

impl ProxyOperationHooks for NoopOperationHooks {}

/// Structured-field tracing for every proxy operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingOperationHooks;

impl ProxyOperationHooks for TracingOperationHooks {
    fn on_request_start(&self, operation: &str, endpoint: &str) {
        tracing::info!(
            phase = "proxy",
            event = "request_start",
            operation,
            endpoint
        );
    }

    fn on_success(&self, operation: &str) {
        tracing::info!(phase = "proxy", event = "success", operation);
    }

    fn on_failure(&self, operation: &str, error: &ProxyError) {
        tracing::warn!(
            phase = "proxy",
            event = "failure",
            operation,
            error_kind = ?error.kind,
            status = ?error.status,
            error = %error
        );
    }
}
