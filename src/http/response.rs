//! HTTP response building module
//!
//! Every status the dispatcher can produce is assembled here. Builders take
//! already-computed header lists so that no negotiation happens at this layer.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderName, ALLOW, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};

/// Response type produced by the dispatcher
pub type HttpResponse = Response<Full<Bytes>>;

/// Build an error response with a short plain-text body
///
/// The body is the canonical status line, followed by `detail` when given.
pub fn build_error_response(
    status: StatusCode,
    headers: &[(HeaderName, String)],
    detail: Option<&str>,
) -> HttpResponse {
    let mut text = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    );
    if let Some(detail) = detail {
        text.push('\n');
        text.push_str(detail);
    }

    let builder = with_headers(Response::builder().status(status), headers)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CONTENT_LENGTH, text.len());
    finish(builder, Bytes::from(text), status.as_str())
}

/// Build 304 Not Modified response
///
/// Only validators are sent; a 304 never carries representation headers.
pub fn build_not_modified_response(validators: &[(HeaderName, String)]) -> HttpResponse {
    let builder = with_headers(
        Response::builder().status(StatusCode::NOT_MODIFIED),
        validators,
    );
    finish(builder, Bytes::new(), "304")
}

/// Build OPTIONS response, optionally carrying preflight grants
pub fn build_options_response(allow: &str, cors: &[(HeaderName, String)]) -> HttpResponse {
    let builder = with_headers(
        Response::builder()
            .status(StatusCode::NO_CONTENT)
            .header(ALLOW, allow),
        cors,
    );
    finish(builder, Bytes::new(), "OPTIONS")
}

/// Build a bodiless success response (201 without resource, 204)
pub fn build_empty_response(status: StatusCode, headers: &[(HeaderName, String)]) -> HttpResponse {
    let builder = with_headers(Response::builder().status(status), headers);
    finish(builder, Bytes::new(), status.as_str())
}

/// Build a response carrying a marshaled representation
///
/// `Content-Length` always reflects the representation, including for HEAD
/// where the body itself is dropped.
pub fn build_representation_response(
    status: StatusCode,
    content_type: &str,
    body: Bytes,
    headers: &[(HeaderName, String)],
    is_head: bool,
) -> HttpResponse {
    let content_length = body.len();
    let body = if is_head { Bytes::new() } else { body };

    let builder = with_headers(Response::builder().status(status), headers)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, content_length);
    finish(builder, body, status.as_str())
}

fn with_headers(mut builder: Builder, headers: &[(HeaderName, String)]) -> Builder {
    for (name, value) in headers {
        builder = builder.header(name.clone(), value.as_str());
    }
    builder
}

/// Finalize a builder; a header that fails validation degrades to a bare 500.
fn finish(builder: Builder, body: Bytes, label: &str) -> HttpResponse {
    builder.body(Full::new(body)).unwrap_or_else(|e| {
        tracing::error!(status = label, error = %e, "failed to build response");
        let mut fallback = Response::new(Full::new(Bytes::new()));
        *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        fallback
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::{ETAG, LOCATION};

    #[test]
    fn test_error_response() {
        let resp = build_error_response(StatusCode::NOT_FOUND, &[], None);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers()[CONTENT_LENGTH], "13");
    }

    #[test]
    fn test_not_modified_has_no_content_type() {
        let resp = build_not_modified_response(&[(ETAG, "\"abc\"".to_string())]);
        assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(resp.headers()[ETAG], "\"abc\"");
        assert!(resp.headers().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_head_keeps_length() {
        let resp = build_representation_response(
            StatusCode::OK,
            "text/plain",
            Bytes::from_static(b"hello"),
            &[],
            true,
        );
        assert_eq!(resp.headers()[CONTENT_LENGTH], "5");
    }

    #[test]
    fn test_invalid_header_degrades() {
        let resp = build_empty_response(
            StatusCode::CREATED,
            &[(LOCATION, "bad\nvalue".to_string())],
        );
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
