//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::error::error_response;

/// The number of bytes of a body to include in the `info` level log.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The largest request body the middleware will buffer, the same as axum's
/// default body limit.
pub const MAX_REQUEST_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Log the request and response for each request.
///
/// The method, URI and status are logged at the `info` level along with the
/// body. If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
///
/// Requests with a body larger than [MAX_REQUEST_BODY_SIZE] bytes are
/// rejected with `413 Payload Too Large` before reaching a handler.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, MAX_REQUEST_BODY_SIZE).await {
        Ok(body) => body,
        Err(error) => {
            tracing::warn!("could not read request body: {error}");
            return error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                &format!(
                    "The request body could not be read, it must be at most \
                    {MAX_REQUEST_BODY_SIZE} bytes."
                ),
                Some("body"),
            );
        }
    };

    let body_text = String::from_utf8_lossy(&body).into_owned();
    tracing::info!(
        method = %parts.method,
        uri = %parts.uri,
        "Received request, body: {}",
        truncate(&body_text, LOG_BODY_LENGTH_LIMIT)
    );
    log_full_body("request", &body_text);

    let response = next
        .run(Request::from_parts(parts, Body::from(body)))
        .await;

    // Responses are built by the handlers, so their size is not capped.
    let (parts, body) = response.into_parts();
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(error) => {
            tracing::error!("could not read response body: {error}");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred, check the server logs for more details.",
                None,
            );
        }
    };

    let body_text = String::from_utf8_lossy(&body).into_owned();
    tracing::info!(
        status = %parts.status,
        "Sending response, body: {}",
        truncate(&body_text, LOG_BODY_LENGTH_LIMIT)
    );
    log_full_body("response", &body_text);

    Response::from_parts(parts, Body::from(body))
}

fn log_full_body(kind: &str, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::debug!("Full {kind} body: {body:?}");
    }
}

/// Cut `text` to at most `limit` bytes without splitting a character, adding
/// an ellipsis when anything was cut.
fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return format!("{text:?}");
    }

    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    format!("{:?}...", &text[..end])
}
