//! REST resource dispatch over hyper
//!
//! Application code supplies *endpoints* (method handlers bound to route
//! patterns) and *resources* (data plus optional caching and ranging
//! capabilities). The [`Mux`] supplies the protocol behaviour around them:
//! route matching with path variables, CORS preflight, method checks,
//! conditional requests, range requests and content negotiation.

pub mod config;
pub mod demo;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod logger;
pub mod mux;
pub mod resource;
pub mod routing;
pub mod server;

pub use endpoint::{
    Capability, Created, Deleter, Endpoint, Getter, Patcher, Poster, Preflighter, Putter,
};
pub use error::RestError;
pub use http::accept::Accept;
pub use http::cors::{AccessControlRequest, AccessControlResponse};
pub use http::range::{ContentRange, IfRangePolicy, Range};
pub use mux::{Mux, MuxOptions};
pub use resource::{Cacheable, Rangeable, Representation, Resource};
pub use routing::{RouteError, RouteVars};
