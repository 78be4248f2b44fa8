//! Spans for controller requests and module runs.

use tracing::field::Empty;
use tracing::{info_span, Span};

/// Recording helpers for the spans created here.
pub trait SpanExt {
    /// HTTP status of a request span.
    fn record_status_code(&self, code: u16);

    fn record_error(&self, error: &dyn std::error::Error);

    fn record_ok(&self);

    fn record_changed(&self);

    fn record_failed(&self, reason: &str);
}

impl SpanExt for Span {
    fn record_status_code(&self, code: u16) {
        self.record("http.status_code", code);
    }

    fn record_error(&self, error: &dyn std::error::Error) {
        self.record("outcome", "error");
        self.record("error", error.to_string().as_str());
    }

    fn record_ok(&self) {
        self.record("outcome", "ok");
        self.record("changed", false);
    }

    fn record_changed(&self) {
        self.record("outcome", "changed");
        self.record("changed", true);
    }

    fn record_failed(&self, reason: &str) {
        self.record("outcome", "failed");
        self.record("error", reason);
    }
}

/// Span for one request to `controller`.
///
/// `path` must not carry a query string, which holds credentials on login
/// and the session identifier everywhere else. Use
/// [`HttpRequest::loggable_path`](crate::connection::HttpRequest::loggable_path).
pub fn create_request_span(method: &str, path: &str, controller: &str) -> Span {
    info_span!(
        "aos_request",
        http.method = %method,
        http.path = %path,
        controller = %controller,
        http.status_code = Empty,
        outcome = Empty,
        error = Empty,
    )
}

/// Span for one module run against `controller`.
pub fn create_module_span(module: &str, controller: &str) -> Span {
    info_span!(
        "aos_module",
        module = %module,
        controller = %controller,
        outcome = Empty,
        changed = Empty,
        error = Empty,
    )
}
