//! Request ID correlation.
//!
//! `tower_http` assigns the ID (honouring an upstream `x-request-id`) and
//! echoes it in the response. This middleware copies it into the current
//! tracing span and the Sentry scope so logs and error reports line up.

use axum::{extract::Request, middleware::Next, response::Response};
use tower_http::request_id::RequestId;
use tracing::Span;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Record the request ID set by `SetRequestIdLayer`.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    if let Some(request_id) = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
    {
        Span::current().record("request_id", request_id);
        sentry::configure_scope(|scope| {
            scope.set_tag("request_id", request_id);
        });
    }

    next.run(request).await
}
