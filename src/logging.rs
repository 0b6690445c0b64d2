//! Middleware for logging requests and responses.

use axum::{extract::Request, middleware::Next, response::Response};

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated
/// and logged in full at the `debug` level. Link and public tokens are
/// redacted before logging.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (headers, body_text) = extract_header_and_body_text_from_request(request).await;

    let display_text = redact_token_field(&body_text, "publicToken");
    log_request(&headers, &display_text);

    let request = Request::from_parts(headers, body_text.into());
    let response = next.run(request).await;

    let (headers, body_text) = extract_header_and_body_text_from_response(response).await;
    let display_text = redact_token_field(&body_text, "linkToken");
    log_response(&headers, &display_text);

    Response::from_parts(headers, body_text.into())
}

/// Replace the string value of a JSON field with asterisks.
///
/// Only the first occurrence is redacted; the fields this is used for appear
/// at most once per body.
fn redact_token_field(body_text: &str, field_name: &str) -> String {
    let needle = format!("\"{field_name}\"");

    let Some(field_start) = body_text.find(&needle) else {
        return body_text.to_string();
    };
    let after_field = field_start + needle.len();

    let Some(colon_offset) = body_text[after_field..].find(':') else {
        return body_text.to_string();
    };
    let Some(quote_offset) = body_text[after_field + colon_offset..].find('"') else {
        return body_text.to_string();
    };

    let value_start = after_field + colon_offset + quote_offset + 1;
    let Some(value_length) = body_text[value_start..].find('"') else {
        return body_text.to_string();
    };

    format!(
        "{}********{}",
        &body_text[..value_start],
        &body_text[value_start + value_length..]
    )
}

async fn extract_header_and_body_text_from_request(
    request: Request,
) -> (axum::http::request::Parts, String) {
    let (headers, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    (headers, String::from_utf8_lossy(&body_bytes).to_string())
}

async fn extract_header_and_body_text_from_response(
    response: Response,
) -> (axum::http::response::Parts, String) {
    let (headers, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    (headers, String::from_utf8_lossy(&body_bytes).to_string())
}

const LOG_BODY_LENGTH_LIMIT: usize = 64;

fn log_request(headers: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {headers:#?}\nbody: {:}...",
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {headers:#?}\nbody: {body:?}");
    }
}

fn log_response(headers: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {headers:#?}\nbody: {:}...",
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {headers:#?}\nbody: {body:?}");
    }
}
