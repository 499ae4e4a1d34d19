//! Request multiplexer
//!
//! Routes are registered once during setup; afterwards [`Mux::serve`] only
//! reads the table, so a shared `Arc<Mux>` needs no locking.
//!
//! Each request runs through a fixed sequence of stages. A stage either
//! hands a value to the next one or answers the request outright:
//!
//! 1. route match (404)
//! 2. CORS preflight (204 with grants)
//! 3. method check (204 for plain `OPTIONS`, 405)
//! 4. capability invocation
//! 5. preconditions (304, 412)
//! 6. range (206, 400, 416)
//! 7. negotiation and marshaling (406)

use std::panic::{self, AssertUnwindSafe};

use hyper::body::Bytes;
use hyper::header::{
    HeaderName, HeaderValue, ACCEPT_RANGES, CONTENT_RANGE, LOCATION, SERVER, VARY,
};
use hyper::{Method, Request, StatusCode};

use crate::endpoint::{Capability, Created, Endpoint};
use crate::error::{join_methods, RestError};
use crate::http::conditional::{self, CacheHeaders, Precondition, Preconditions};
use crate::http::cors::{self, AccessControlRequest};
use crate::http::range::{self, IfRangePolicy};
use crate::http::response::{
    build_empty_response, build_not_modified_response, build_options_response,
    build_representation_response, HttpResponse,
};
use crate::resource::{represent, Resource};
use crate::routing::{RouteError, RouteTable, RouteVars};

const DEFAULT_SERVER_NAME: &str = "restmux";

/// Dispatch behaviour that is not per-route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuxOptions {
    /// How `If-Range` interacts with `Range`
    pub if_range: IfRangePolicy,
    /// Value of the `Server` header on every response
    pub server_name: String,
}

impl Default for MuxOptions {
    fn default() -> Self {
        Self {
            if_range: IfRangePolicy::default(),
            server_name: DEFAULT_SERVER_NAME.to_string(),
        }
    }
}

/// Outcome of a stage: keep going with a value, or answer now
enum Step<T> {
    Continue(T),
    Respond(HttpResponse),
}

/// Unwrap a [`Step`], returning early with its response
macro_rules! proceed {
    ($step:expr) => {
        match $step {
            Step::Continue(value) => value,
            Step::Respond(response) => return Ok(response),
        }
    };
}

/// What a capability handed back
enum Outcome {
    Resource {
        status: StatusCode,
        resource: Box<dyn Resource>,
        headers: Vec<(HeaderName, String)>,
    },
    Empty {
        status: StatusCode,
        headers: Vec<(HeaderName, String)>,
    },
}

pub struct Mux {
    routes: RouteTable<Box<dyn Endpoint>>,
    options: MuxOptions,
    server: HeaderValue,
}

impl Default for Mux {
    fn default() -> Self {
        Self::with_options(MuxOptions::default())
    }
}

impl Mux {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: MuxOptions) -> Self {
        let server = HeaderValue::from_str(&options.server_name).unwrap_or_else(|_| {
            tracing::warn!(
                server_name = %options.server_name,
                "server name is not a valid header value, using default"
            );
            HeaderValue::from_static(DEFAULT_SERVER_NAME)
        });
        Self {
            routes: RouteTable::new(),
            options,
            server,
        }
    }

    pub const fn options(&self) -> &MuxOptions {
        &self.options
    }

    /// Bind `endpoint` to `pattern`
    ///
    /// # Examples
    /// ```
    /// use restmux::{Endpoint, Mux};
    ///
    /// struct Empty;
    /// impl Endpoint for Empty {}
    ///
    /// let mut mux = Mux::new();
    /// mux.register("/a/{id}", Empty).unwrap();
    /// assert!(mux.register("/a/{other}", Empty).is_err());
    /// assert!(mux.register("a", Empty).is_err());
    /// ```
    pub fn register(
        &mut self,
        pattern: &str,
        endpoint: impl Endpoint + 'static,
    ) -> Result<&mut Self, RouteError> {
        if let Err(e) = self.routes.insert(pattern, Box::new(endpoint)) {
            tracing::warn!(pattern, error = %e, "route rejected");
            return Err(e);
        }
        tracing::debug!(pattern, "route registered");
        Ok(self)
    }

    /// Registered patterns in match order
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.routes.patterns()
    }

    /// Answer one request
    ///
    /// Never fails: errors become their status responses and a panic in
    /// endpoint or resource code becomes a 500 for this request only.
    pub fn serve(&self, req: &Request<Bytes>) -> HttpResponse {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(req)));
        let mut response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                if let RestError::Internal(source) = &err {
                    tracing::error!(
                        method = %req.method(),
                        path = req.uri().path(),
                        error = %source,
                        "internal error"
                    );
                } else {
                    tracing::debug!(
                        method = %req.method(),
                        path = req.uri().path(),
                        status = err.status().as_u16(),
                        error = %err,
                        "request rejected"
                    );
                }
                err.to_response()
            }
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(
                    method = %req.method(),
                    path = req.uri().path(),
                    panic = %message,
                    "handler panicked"
                );
                RestError::internal(message).to_response()
            }
        };
        self.stamp(&mut response);
        response
    }

    /// Add the `Server` header to a response built outside [`Mux::serve`]
    pub fn stamp(&self, response: &mut HttpResponse) {
        response.headers_mut().insert(SERVER, self.server.clone());
    }

    fn dispatch(&self, req: &Request<Bytes>) -> Result<HttpResponse, RestError> {
        let (endpoint, vars) = self
            .routes
            .find(req.uri().path())
            .ok_or(RestError::NotFound)?;
        let endpoint = endpoint.as_ref();

        proceed!(preflight(endpoint, req)?);
        let capability = proceed!(check_method(endpoint, req)?);

        let (status, resource, mut headers) = match invoke(endpoint, capability, &vars, req)? {
            Outcome::Empty { status, headers } => {
                return Ok(build_empty_response(status, &headers));
            }
            Outcome::Resource {
                status,
                resource,
                headers,
            } => (status, resource, headers),
        };

        let cache = resource.as_cacheable().map(CacheHeaders::from_cacheable);
        if let Some(cache) = &cache {
            proceed!(check_preconditions(req, cache)?);
            headers.extend(cache.headers());
        }

        let (status, resource) =
            self.apply_range(req, status, resource, cache.as_ref(), &mut headers)?;

        let representation = represent(resource.as_ref(), req)?;
        headers.push((VARY, "Accept".to_string()));
        Ok(build_representation_response(
            status,
            &representation.media_type,
            representation.body,
            &headers,
            req.method() == Method::HEAD,
        ))
    }

    /// Serve a sub-range of a rangeable resource on `GET`/`HEAD`
    fn apply_range(
        &self,
        req: &Request<Bytes>,
        status: StatusCode,
        resource: Box<dyn Resource>,
        cache: Option<&CacheHeaders>,
        headers: &mut Vec<(HeaderName, String)>,
    ) -> Result<(StatusCode, Box<dyn Resource>), RestError> {
        if !is_read(req.method()) {
            return Ok((status, resource));
        }

        let partial = match resource.as_rangeable() {
            None => None,
            Some(rangeable) => {
                headers.push((ACCEPT_RANGES, rangeable.range_unit().to_string()));
                match range::evaluate(req, rangeable, cache, self.options.if_range)? {
                    None => None,
                    Some(range) => Some(rangeable.range(&range)?),
                }
            }
        };

        Ok(match partial {
            Some((content_range, sub)) => {
                tracing::debug!(content_range = %content_range, "serving partial content");
                headers.push((CONTENT_RANGE, content_range.to_string()));
                (StatusCode::PARTIAL_CONTENT, sub)
            }
            None => (status, resource),
        })
    }
}

fn is_read(method: &Method) -> bool {
    method == Method::GET || method == Method::HEAD
}

fn preflight(endpoint: &dyn Endpoint, req: &Request<Bytes>) -> Result<Step<()>, RestError> {
    let Some(ac) = AccessControlRequest::from_request(req)? else {
        return Ok(Step::Continue(()));
    };
    let grants = cors::negotiate(&ac, endpoint, req)?;
    tracing::debug!(
        origin = ac.origin.as_deref().unwrap_or("-"),
        method = %ac.method,
        granted = !grants.is_empty(),
        "preflight answered"
    );
    Ok(Step::Respond(build_options_response(
        &join_methods(&endpoint.allowed_methods()),
        &grants,
    )))
}

fn check_method(
    endpoint: &dyn Endpoint,
    req: &Request<Bytes>,
) -> Result<Step<Capability>, RestError> {
    if req.method() == Method::OPTIONS {
        return Ok(Step::Respond(build_options_response(
            &join_methods(&endpoint.allowed_methods()),
            &[],
        )));
    }
    match Capability::from_method(req.method()) {
        Some(capability) if endpoint.implements(capability) => Ok(Step::Continue(capability)),
        _ => Err(RestError::MethodNotAllowed {
            allowed: endpoint.allowed_methods(),
        }),
    }
}

fn invoke(
    endpoint: &dyn Endpoint,
    capability: Capability,
    vars: &RouteVars,
    req: &Request<Bytes>,
) -> Result<Outcome, RestError> {
    let updated = |resource: Option<Box<dyn Resource>>| match resource {
        Some(resource) => Outcome::Resource {
            status: StatusCode::OK,
            resource,
            headers: Vec::new(),
        },
        None => Outcome::Empty {
            status: StatusCode::NO_CONTENT,
            headers: Vec::new(),
        },
    };

    // Accessors were checked by `check_method`; a vanished capability is a 405
    let missing = || RestError::MethodNotAllowed {
        allowed: endpoint.allowed_methods(),
    };

    Ok(match capability {
        Capability::Get => {
            let resource = endpoint.getter().ok_or_else(missing)?.get(vars, req)?;
            Outcome::Resource {
                status: StatusCode::OK,
                resource: resource.ok_or(RestError::NotFound)?,
                headers: Vec::new(),
            }
        }
        Capability::Post => {
            let Created { resource, location } =
                endpoint.poster().ok_or_else(missing)?.post(vars, req)?;
            let headers: Vec<_> = location.map(|l| (LOCATION, l)).into_iter().collect();
            match resource {
                Some(resource) => Outcome::Resource {
                    status: StatusCode::CREATED,
                    resource,
                    headers,
                },
                None if headers.is_empty() => Outcome::Empty {
                    status: StatusCode::NO_CONTENT,
                    headers,
                },
                None => Outcome::Empty {
                    status: StatusCode::CREATED,
                    headers,
                },
            }
        }
        Capability::Put => updated(endpoint.putter().ok_or_else(missing)?.put(vars, req)?),
        Capability::Patch => updated(endpoint.patcher().ok_or_else(missing)?.patch(vars, req)?),
        Capability::Delete => {
            endpoint.deleter().ok_or_else(missing)?.delete(vars, req)?;
            Outcome::Empty {
                status: StatusCode::NO_CONTENT,
                headers: Vec::new(),
            }
        }
    })
}

fn check_preconditions(req: &Request<Bytes>, cache: &CacheHeaders) -> Result<Step<()>, RestError> {
    let preconditions = Preconditions::from_request(req);
    if preconditions.is_empty() {
        return Ok(Step::Continue(()));
    }
    match conditional::evaluate(req.method(), &preconditions, cache)? {
        Precondition::Proceed => Ok(Step::Continue(())),
        Precondition::NotModified => Ok(Step::Respond(build_not_modified_response(
            &cache.validators(),
        ))),
    }
}
