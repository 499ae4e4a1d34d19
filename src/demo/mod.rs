//! Demo application
//!
//! A small people/employers service wired onto the mux. The binary serves
//! it and the integration tests drive it.

mod endpoints;
mod people;

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use hyper::body::Bytes;

use crate::http::accept::Accept;
use crate::mux::{Mux, MuxOptions};
use crate::routing::RouteError;

pub use endpoints::{
    EchoEndpoint, EmployerEndpoint, EmployersEndpoint, PeopleEndpoint, PersonEndpoint, ECHO_ORIGIN,
};
pub use people::{Collection, Employer, FixtureError, PeopleStore, Person};

/// Media type every demo resource answers with canned content
pub const CANNED_TYPE: &str = "hello/world";

/// Body served for [`CANNED_TYPE`]
pub const CANNED_BYTES: &[u8] = b"hello, world!";

/// `Last-Modified` of every demo record: 2014-04-14 10:00:00 UTC
pub fn reference_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_397_469_600, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Representation override shared by the demo resources
fn canned_override(accept: &Accept) -> Option<&'static str> {
    accept.accepts_exactly(CANNED_TYPE).then_some(CANNED_TYPE)
}

fn canned_body() -> Bytes {
    Bytes::from_static(CANNED_BYTES)
}

/// Register the demo routes
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use restmux::demo::{build_mux, PeopleStore};
/// use restmux::MuxOptions;
///
/// let mux = build_mux(Arc::new(PeopleStore::seed(3)), MuxOptions::default()).unwrap();
/// assert_eq!(mux.patterns().count(), 5);
/// ```
pub fn build_mux(store: Arc<PeopleStore>, options: MuxOptions) -> Result<Mux, RouteError> {
    let mut mux = Mux::with_options(options);
    mux.register("/echo", EchoEndpoint)?
        .register("/people", PeopleEndpoint::new(Arc::clone(&store)))?
        .register("/people/{id}", PersonEndpoint::new(Arc::clone(&store)))?
        .register("/employers", EmployersEndpoint::new(Arc::clone(&store)))?
        .register("/employers/{name}", EmployerEndpoint::new(store))?;
    Ok(mux)
}
