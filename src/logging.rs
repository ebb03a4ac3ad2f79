//! Middleware for logging requests and responses.

use axum::{extract::Request, middleware::Next, response::Response};

/// Fields whose values must never reach the logs. Both the Google ID token
/// on sign-in and the session token in its response travel as `token`.
const CREDENTIAL_FIELDS: [&str; 1] = ["token"];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// Credential fields in JSON bodies are redacted. If a body is longer than
/// [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated and logged at the `debug`
/// level.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (headers, body_text) = extract_header_and_body_text_from_request(request).await;

    log_request(&headers, &redact_credentials(&body_text));

    let request = Request::from_parts(headers, body_text.into());
    let response = next.run(request).await;

    let (headers, body_text) = extract_header_and_body_text_from_response(response).await;
    log_response(&headers, &redact_credentials(&body_text));

    Response::from_parts(headers, body_text.into())
}

fn redact_credentials(body_text: &str) -> String {
    CREDENTIAL_FIELDS
        .iter()
        .fold(body_text.to_string(), |text, field| {
            redact_field(&text, field)
        })
}

/// Replace the string value of `field_name` in a JSON body with asterisks.
///
/// Works on the raw text rather than a parsed document so malformed bodies
/// still get logged. Escaped quotes inside the value are not handled, which
/// is fine for the JWTs this redacts.
fn redact_field(body_text: &str, field_name: &str) -> String {
    let needle = format!("\"{field_name}\"");

    let Some(field_position) = body_text.find(&needle) else {
        return body_text.to_string();
    };

    let after_field = field_position + needle.len();
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
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();

    (headers, String::from_utf8_lossy(&body_bytes).to_string())
}

async fn extract_header_and_body_text_from_response(
    response: Response,
) -> (axum::http::response::Parts, String) {
    let (headers, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();

    (headers, String::from_utf8_lossy(&body_bytes).to_string())
}

const LOG_BODY_LENGTH_LIMIT: usize = 64;

fn log_request(headers: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {} {}\nbody: {:}...",
            headers.method,
            headers.uri,
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!(
            "Received request: {} {}\nbody: {body:?}",
            headers.method,
            headers.uri
        );
    }
}

fn log_response(headers: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {}\nbody: {:}...",
            headers.status,
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {}\nbody: {body:?}", headers.status);
    }
}

#[cfg(test)]
mod tests {
    use super::{redact_credentials, redact_field};

    #[test]
    fn redacts_the_google_token_in_a_sign_in_request() {
        let body = r#"{"token": "eyJhbGciOiJSUzI1NiJ9.payload.sig"}"#;

        assert_eq!(redact_credentials(body), r#"{"token": "********"}"#);
    }

    #[test]
    fn leaves_bodies_without_the_field_alone() {
        let body = r#"{"name": "Materials"}"#;

        assert_eq!(redact_field(body, "token"), body);
    }

    #[test]
    fn redacts_the_session_token_in_a_sign_in_response() {
        let body = r#"{"token":"abc.def.ghi","user":{"email":"test@example.com"}}"#;

        assert_eq!(
            redact_credentials(body),
            r#"{"token":"********","user":{"email":"test@example.com"}}"#
        );
    }

    #[test]
    fn malformed_bodies_are_returned_unchanged() {
        let body = r#"{"token": 42"#;

        assert_eq!(redact_field(body, "token"), body);
    }
}
