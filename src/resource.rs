//! Resource capabilities
//!
//! Every resource can represent itself. Caching and ranging are optional
//! capabilities, queried at dispatch time through [`Resource::as_cacheable`]
//! and [`Resource::as_rangeable`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use hyper::body::Bytes;
use hyper::Request;

use crate::error::RestError;
use crate::http::accept::Accept;
use crate::http::mime::APPLICATION_JSON;
use crate::http::range::{ContentRange, Range};

/// A unit of served data, built fresh for each request
pub trait Resource {
    /// Media types this resource can be marshaled into, canonical first
    fn media_types(&self) -> &[&str] {
        &[APPLICATION_JSON]
    }

    /// Override point: force a representation regardless of generic
    /// negotiation. Returning `Some` bypasses the negotiator.
    fn select_media_type(&self, _accept: &Accept) -> Option<&str> {
        None
    }

    /// Encode the resource as `media_type`
    fn marshal(&self, media_type: &str, req: &Request<Bytes>) -> Result<Bytes, RestError>;

    fn as_cacheable(&self) -> Option<&dyn Cacheable> {
        None
    }

    fn as_rangeable(&self) -> Option<&dyn Rangeable> {
        None
    }
}

/// Validators and freshness for conditional requests
pub trait Cacheable {
    /// Opaque entity tag; equal tags mean equal representations
    fn etag(&self) -> String;

    fn last_modified(&self) -> DateTime<Utc>;

    /// How long downstream caches may consider the representation fresh
    fn ttl(&self) -> Duration;
}

/// Resources that can serve a numbered sub-slice of themselves
pub trait Rangeable {
    /// Unit accepted in `Range` headers
    fn range_unit(&self) -> &str {
        "items"
    }

    /// Total number of elements
    fn count(&self) -> u64;

    /// Slice the resource. `range` is already validated against
    /// [`Rangeable::count`] and [`Rangeable::range_unit`].
    fn range(&self, range: &Range) -> Result<(ContentRange, Box<dyn Resource>), RestError>;
}

/// A marshaled resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Representation {
    pub media_type: String,
    pub body: Bytes,
}

/// Negotiate a media type for `resource` and marshal it
///
/// The resource's own [`Resource::select_media_type`] wins over the
/// generic negotiator.
pub fn represent(
    resource: &dyn Resource,
    req: &Request<Bytes>,
) -> Result<Representation, RestError> {
    let accept = Accept::from_request(req);
    let media_type = match resource.select_media_type(&accept) {
        Some(forced) => forced.to_string(),
        None => accept
            .negotiate(resource.media_types())
            .ok_or_else(|| RestError::NotAcceptable {
                available: resource
                    .media_types()
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            })?
            .to_string(),
    };

    let body = resource.marshal(&media_type, req)?;
    Ok(Representation { media_type, body })
}
