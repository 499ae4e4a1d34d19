//! Dispatch failure taxonomy
//!
//! Engine components never write to a response. They report a [`RestError`]
//! and the mux translates it with [`RestError::to_response`].

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderName, ACCEPT_RANGES, ALLOW, CONTENT_RANGE};
use hyper::{Method, Response, StatusCode};
use thiserror::Error;

use crate::http::response::build_error_response;

/// Boxed application error carried by [`RestError::Internal`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum RestError {
    #[error("resource not found")]
    NotFound,

    #[error("method not allowed, allowed: {}", join_methods(.allowed))]
    MethodNotAllowed { allowed: Vec<Method> },

    #[error("no acceptable representation, available: {}", .available.join(", "))]
    NotAcceptable { available: Vec<String> },

    #[error("unsupported media type, expected one of: {}", .supported.join(", "))]
    UnsupportedMediaType { supported: Vec<String> },

    /// The `Range` header could not be parsed.
    #[error("malformed range header")]
    MalformedRange { unit: String },

    #[error("unsupported range unit, expected {unit}")]
    UnsupportedRangeUnit { unit: String },

    #[error("range not satisfiable for {count} {unit}")]
    RangeNotSatisfiable { unit: String, count: u64 },

    #[error("precondition failed")]
    PreconditionFailed,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    /// Opaque application failure. The source is logged, never sent.
    #[error("internal error: {0}")]
    Internal(#[source] BoxError),
}

impl RestError {
    /// Wrap any application error as an internal fault.
    pub fn internal(err: impl Into<BoxError>) -> Self {
        Self::Internal(err.into())
    }

    pub fn unsupported_media_type(supported: &[&str]) -> Self {
        Self::UnsupportedMediaType {
            supported: supported.iter().map(ToString::to_string).collect(),
        }
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotAcceptable { .. } => StatusCode::NOT_ACCEPTABLE,
            Self::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::MalformedRange { .. } | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedRangeUnit { .. } | Self::RangeNotSatisfiable { .. } => {
                StatusCode::RANGE_NOT_SATISFIABLE
            }
            Self::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Headers the status line requires (`Allow`, `Accept-Ranges`, ...).
    pub fn headers(&self) -> Vec<(HeaderName, String)> {
        match self {
            Self::MethodNotAllowed { allowed } => vec![(ALLOW, join_methods(allowed))],
            Self::MalformedRange { unit } | Self::UnsupportedRangeUnit { unit } => {
                vec![(ACCEPT_RANGES, unit.clone())]
            }
            Self::RangeNotSatisfiable { unit, count } => vec![
                (ACCEPT_RANGES, unit.clone()),
                (CONTENT_RANGE, format!("{unit} */{count}")),
            ],
            _ => Vec::new(),
        }
    }

    /// Short body text. Internal faults only ever expose the reason phrase.
    fn detail(&self) -> Option<String> {
        match self {
            Self::NotAcceptable { .. }
            | Self::UnsupportedMediaType { .. }
            | Self::BadRequest(_)
            | Self::PayloadTooLarge { .. } => Some(self.to_string()),
            _ => None,
        }
    }

    pub fn to_response(&self) -> Response<Full<Bytes>> {
        build_error_response(self.status(), &self.headers(), self.detail().as_deref())
    }
}

impl From<serde_json::Error> for RestError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(err)
    }
}

/// Render a method list the way `Allow` expects it.
pub fn join_methods(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
