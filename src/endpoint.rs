//! Endpoint capabilities
//!
//! An endpoint is bound to one route pattern. Each HTTP method it supports
//! is a separate narrow trait; [`Endpoint`] exposes them through accessors
//! that return `None` unless the implementor opts in:
//!
//! ```
//! use hyper::body::Bytes;
//! use hyper::Request;
//! use restmux::endpoint::MaybeResource;
//! use restmux::{Endpoint, Getter, RouteVars};
//!
//! struct Ping;
//!
//! impl Getter for Ping {
//!     fn get(&self, _: &RouteVars, _: &Request<Bytes>) -> MaybeResource {
//!         Ok(None)
//!     }
//! }
//!
//! impl Endpoint for Ping {
//!     fn getter(&self) -> Option<&dyn Getter> {
//!         Some(self)
//!     }
//! }
//!
//! assert!(Ping.allows(&hyper::Method::HEAD));
//! assert!(!Ping.allows(&hyper::Method::POST));
//! ```

use hyper::body::Bytes;
use hyper::{Method, Request};

use crate::error::RestError;
use crate::http::cors::{AccessControlRequest, AccessControlResponse};
use crate::resource::Resource;
use crate::routing::RouteVars;

/// Result of a handler that may find nothing (`Ok(None)` is a 404 for reads)
pub type MaybeResource = Result<Option<Box<dyn Resource>>, RestError>;

/// What a `POST` produced
#[derive(Default)]
pub struct Created {
    pub resource: Option<Box<dyn Resource>>,
    /// Sent back as `Location`
    pub location: Option<String>,
}

impl Created {
    pub fn new(resource: impl Resource + 'static) -> Self {
        Self {
            resource: Some(Box::new(resource)),
            location: None,
        }
    }

    #[must_use]
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

pub trait Getter {
    fn get(&self, vars: &RouteVars, req: &Request<Bytes>) -> MaybeResource;
}

pub trait Poster {
    fn post(&self, vars: &RouteVars, req: &Request<Bytes>) -> Result<Created, RestError>;
}

pub trait Putter {
    fn put(&self, vars: &RouteVars, req: &Request<Bytes>) -> MaybeResource;
}

pub trait Patcher {
    fn patch(&self, vars: &RouteVars, req: &Request<Bytes>) -> MaybeResource;
}

pub trait Deleter {
    fn delete(&self, vars: &RouteVars, req: &Request<Bytes>) -> Result<(), RestError>;
}

/// Grants for CORS preflight requests
pub trait Preflighter {
    fn preflight(&self, ac: &AccessControlRequest, req: &Request<Bytes>) -> AccessControlResponse;
}

/// Method-dispatch target of a route
pub trait Endpoint: Send + Sync {
    fn getter(&self) -> Option<&dyn Getter> {
        None
    }

    fn poster(&self) -> Option<&dyn Poster> {
        None
    }

    fn putter(&self) -> Option<&dyn Putter> {
        None
    }

    fn patcher(&self) -> Option<&dyn Patcher> {
        None
    }

    fn deleter(&self) -> Option<&dyn Deleter> {
        None
    }

    fn preflighter(&self) -> Option<&dyn Preflighter> {
        None
    }

    /// Whether `capability` is implemented
    fn implements(&self, capability: Capability) -> bool {
        match capability {
            Capability::Get => self.getter().is_some(),
            Capability::Post => self.poster().is_some(),
            Capability::Put => self.putter().is_some(),
            Capability::Patch => self.patcher().is_some(),
            Capability::Delete => self.deleter().is_some(),
        }
    }

    /// Methods answered on this route, as listed in `Allow`
    ///
    /// `HEAD` follows `GET`; `OPTIONS` is always answered by the mux.
    fn allowed_methods(&self) -> Vec<Method> {
        let mut methods = Vec::with_capacity(7);
        for capability in Capability::ALL {
            if self.implements(capability) {
                methods.push(capability.method());
                if capability == Capability::Get {
                    methods.push(Method::HEAD);
                }
            }
        }
        methods.push(Method::OPTIONS);
        methods
    }

    fn allows(&self, method: &Method) -> bool {
        *method == Method::OPTIONS
            || Capability::from_method(method).is_some_and(|c| self.implements(c))
    }
}

/// Method capabilities an endpoint may implement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Capability {
    pub const ALL: [Self; 5] = [Self::Get, Self::Post, Self::Put, Self::Patch, Self::Delete];

    /// Capability serving `method`; `HEAD` is served by `Get`
    pub fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::GET | Method::HEAD => Some(Self::Get),
            Method::POST => Some(Self::Post),
            Method::PUT => Some(Self::Put),
            Method::PATCH => Some(Self::Patch),
            Method::DELETE => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn method(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
            Self::Patch => Method::PATCH,
            Self::Delete => Method::DELETE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Collection;

    impl Getter for Collection {
        fn get(&self, _: &RouteVars, _: &Request<Bytes>) -> MaybeResource {
            Ok(None)
        }
    }

    impl Deleter for Collection {
        fn delete(&self, _: &RouteVars, _: &Request<Bytes>) -> Result<(), RestError> {
            Ok(())
        }
    }

    impl Endpoint for Collection {
        fn getter(&self) -> Option<&dyn Getter> {
            Some(self)
        }

        fn deleter(&self) -> Option<&dyn Deleter> {
            Some(self)
        }
    }

    #[test]
    fn test_capability_from_method() {
        assert_eq!(Capability::from_method(&Method::HEAD), Some(Capability::Get));
        assert_eq!(Capability::from_method(&Method::PATCH), Some(Capability::Patch));
        assert_eq!(Capability::from_method(&Method::OPTIONS), None);
        assert_eq!(Capability::from_method(&Method::TRACE), None);
    }

    #[test]
    fn test_allowed_methods() {
        assert_eq!(
            Collection.allowed_methods(),
            vec![Method::GET, Method::HEAD, Method::DELETE, Method::OPTIONS]
        );
    }

    #[test]
    fn test_allows() {
        assert!(Collection.allows(&Method::GET));
        assert!(Collection.allows(&Method::OPTIONS));
        assert!(!Collection.allows(&Method::POST));
        assert!(!Collection.allows(&Method::CONNECT));
    }
}
