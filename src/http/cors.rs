//! CORS preflight module
//!
//! Recognises preflight requests and composes `Access-Control-Allow-*`
//! headers from the grants an endpoint hands back.

use std::time::Duration;

use hyper::body::Bytes;
use hyper::header::{
    HeaderName, ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
    ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD, ORIGIN, VARY,
};
use hyper::{Method, Request};

use crate::endpoint::{Capability, Endpoint};
use crate::error::{join_methods, RestError};

/// What a preflight asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessControlRequest {
    pub origin: Option<String>,
    pub method: Method,
    pub headers: Vec<String>,
}

impl AccessControlRequest {
    /// Build from an `OPTIONS` request carrying `Access-Control-Request-Method`
    ///
    /// Returns `Ok(None)` for anything that is not a preflight.
    pub fn from_request<B>(req: &Request<B>) -> Result<Option<Self>, RestError> {
        if req.method() != Method::OPTIONS {
            return Ok(None);
        }
        let Some(requested) = req.headers().get(ACCESS_CONTROL_REQUEST_METHOD) else {
            return Ok(None);
        };

        let method = Method::from_bytes(requested.as_bytes()).map_err(|_| {
            RestError::BadRequest("invalid Access-Control-Request-Method".to_string())
        })?;
        let origin = req
            .headers()
            .get(ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let headers = req
            .headers()
            .get_all(ACCESS_CONTROL_REQUEST_HEADERS)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Some(Self {
            origin,
            method,
            headers,
        }))
    }
}

/// What an endpoint is willing to grant
///
/// Empty `methods` defaults to every method the endpoint implements; empty
/// `headers` grants whatever was requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessControlResponse {
    pub origin: String,
    pub methods: Vec<Method>,
    pub headers: Vec<String>,
    pub credentials: bool,
    pub max_age: Duration,
}

impl AccessControlResponse {
    /// Grant `origin` with every other field defaulted
    pub fn for_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Render the grant as response headers
    pub fn headers(
        &self,
        request: &AccessControlRequest,
        implemented: &[Method],
    ) -> Vec<(HeaderName, String)> {
        let mut headers = Vec::with_capacity(6);
        if !self.origin.is_empty() {
            headers.push((ACCESS_CONTROL_ALLOW_ORIGIN, self.origin.clone()));
            headers.push((VARY, "Origin".to_string()));
        }

        let methods = if self.methods.is_empty() {
            join_methods(implemented)
        } else {
            join_methods(&self.methods)
        };
        headers.push((ACCESS_CONTROL_ALLOW_METHODS, methods));

        let allowed_headers = if self.headers.is_empty() {
            &request.headers
        } else {
            &self.headers
        };
        if !allowed_headers.is_empty() {
            headers.push((ACCESS_CONTROL_ALLOW_HEADERS, allowed_headers.join(", ")));
        }

        if self.credentials {
            headers.push((ACCESS_CONTROL_ALLOW_CREDENTIALS, "true".to_string()));
        }
        if !self.max_age.is_zero() {
            headers.push((ACCESS_CONTROL_MAX_AGE, self.max_age.as_secs().to_string()));
        }
        headers
    }
}

/// Negotiate a preflight against the target endpoint
///
/// The requested method must map to a capability the endpoint implements
/// (`OPTIONS` never does), otherwise the preflight is refused with
/// method-not-allowed and no CORS headers. An
/// endpoint without a preflight capability yields no CORS headers.
pub fn negotiate(
    ac: &AccessControlRequest,
    endpoint: &dyn Endpoint,
    req: &Request<Bytes>,
) -> Result<Vec<(HeaderName, String)>, RestError> {
    let implemented = endpoint.allowed_methods();
    let implements =
        Capability::from_method(&ac.method).is_some_and(|c| endpoint.implements(c));
    if !implements {
        tracing::debug!(method = %ac.method, "preflight for unimplemented method");
        return Err(RestError::MethodNotAllowed {
            allowed: implemented,
        });
    }

    Ok(endpoint.preflighter().map_or_else(Vec::new, |preflighter| {
        preflighter.preflight(ac, req).headers(ac, &implemented)
    }))
}
