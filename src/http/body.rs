//! Request and response body helpers for JSON endpoints

use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::Request;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::mime::essence_of;
use crate::error::RestError;

/// Reject a request whose `Content-Type` essence is not in `supported`
///
/// A missing or unparsable `Content-Type` is rejected too.
pub fn require_content_type<B>(req: &Request<B>, supported: &[&str]) -> Result<(), RestError> {
    let essence = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(essence_of);

    match essence {
        Some(essence) if supported.iter().any(|s| s.eq_ignore_ascii_case(&essence)) => Ok(()),
        _ => Err(RestError::unsupported_media_type(supported)),
    }
}

/// Decode the request body as JSON
pub fn json_body<T: DeserializeOwned>(req: &Request<Bytes>) -> Result<T, RestError> {
    serde_json::from_slice(req.body())
        .map_err(|e| RestError::BadRequest(format!("invalid JSON body: {e}")))
}

/// Encode `value` as a JSON body
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Bytes, RestError> {
    Ok(Bytes::from(serde_json::to_vec(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mime::APPLICATION_JSON;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Greeting {
        text: String,
    }

    fn request(content_type: Option<&str>, body: &'static str) -> Request<Bytes> {
        let mut builder = Request::builder();
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        builder.body(Bytes::from_static(body.as_bytes())).unwrap()
    }

    #[test]
    fn test_require_content_type() {
        let supported = [APPLICATION_JSON];
        assert!(require_content_type(&request(Some("application/json"), ""), &supported).is_ok());
        assert!(require_content_type(
            &request(Some("Application/JSON; charset=utf-8"), ""),
            &supported
        )
        .is_ok());

        let err = require_content_type(&request(Some("text/plain"), ""), &supported).unwrap_err();
        assert_eq!(err.status(), hyper::StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(require_content_type(&request(None, ""), &supported).is_err());
    }

    #[test]
    fn test_json_body() {
        let greeting: Greeting = json_body(&request(None, r#"{"text":"hi"}"#)).unwrap();
        assert_eq!(greeting.text, "hi");

        let err = json_body::<Greeting>(&request(None, "{")).unwrap_err();
        assert_eq!(err.status(), hyper::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_to_json() {
        assert_eq!(to_json(&[1, 2]).unwrap(), Bytes::from_static(b"[1,2]"));
    }
}
