//! Conditional request module
//!
//! Entity tag comparison, HTTP date handling and precondition evaluation
//! (`If-Match`, `If-None-Match`, `If-Modified-Since`, `If-Unmodified-Since`)
//! for resources that expose cache validators.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hyper::header::{
    HeaderName, CACHE_CONTROL, ETAG, IF_MATCH, IF_MODIFIED_SINCE, IF_NONE_MATCH,
    IF_UNMODIFIED_SINCE, LAST_MODIFIED,
};
use hyper::{Method, Request};

use crate::error::RestError;
use crate::resource::Cacheable;

/// `strftime` pattern of IMF-fixdate, e.g. `Mon, 14 Apr 2014 10:00:00 GMT`
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// An entity tag, either strong (`"v1"`) or weak (`W/"v1"`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTag {
    weak: bool,
    opaque: String,
}

impl EntityTag {
    pub fn strong(opaque: impl Into<String>) -> Self {
        Self {
            weak: false,
            opaque: opaque.into(),
        }
    }

    /// Parse a tag from the wire; bare unquoted tags are tolerated
    ///
    /// # Examples
    /// ```
    /// use restmux::http::conditional::EntityTag;
    /// let tag = EntityTag::parse("W/\"abc\"").unwrap();
    /// assert!(tag.is_weak());
    /// assert_eq!(tag.opaque(), "abc");
    /// ```
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let (weak, rest) = match value.strip_prefix("W/") {
            Some(rest) => (true, rest),
            None => (false, value),
        };
        let opaque = rest
            .strip_prefix('"')
            .and_then(|r| r.strip_suffix('"'))
            .unwrap_or(rest);
        if opaque.is_empty() || opaque.contains('"') {
            return None;
        }
        Some(Self {
            weak,
            opaque: opaque.to_string(),
        })
    }

    pub const fn is_weak(&self) -> bool {
        self.weak
    }

    pub fn opaque(&self) -> &str {
        &self.opaque
    }

    /// Strong comparison: both tags strong and byte-equal
    pub fn strong_eq(&self, other: &Self) -> bool {
        !self.weak && !other.weak && self.opaque == other.opaque
    }

    /// Weak comparison: weakness markers are ignored
    pub fn weak_eq(&self, other: &Self) -> bool {
        self.opaque == other.opaque
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.weak {
            write!(f, "W/\"{}\"", self.opaque)
        } else {
            write!(f, "\"{}\"", self.opaque)
        }
    }
}

/// Value of `If-Match` / `If-None-Match`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagList {
    /// `*`
    Any,
    Tags(Vec<EntityTag>),
}

impl TagList {
    /// Parse a comma-separated tag list, keeping commas inside quotes
    pub fn parse(value: &str) -> Self {
        if value.trim() == "*" {
            return Self::Any;
        }

        let mut tags = Vec::new();
        let mut in_quotes = false;
        let mut start = 0;
        for (idx, ch) in value.char_indices() {
            match ch {
                '"' => in_quotes = !in_quotes,
                ',' if !in_quotes => {
                    tags.extend(EntityTag::parse(&value[start..idx]));
                    start = idx + 1;
                }
                _ => {}
            }
        }
        tags.extend(EntityTag::parse(&value[start..]));
        Self::Tags(tags)
    }

    /// Whether the list names `current`; `*` matches any existing representation
    fn matches(&self, current: Option<&EntityTag>, strong: bool) -> bool {
        match self {
            Self::Any => true,
            Self::Tags(tags) => current.is_some_and(|current| {
                tags.iter().any(|tag| {
                    if strong {
                        tag.strong_eq(current)
                    } else {
                        tag.weak_eq(current)
                    }
                })
            }),
        }
    }
}

/// Precondition headers of a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preconditions {
    pub if_match: Option<TagList>,
    pub if_none_match: Option<TagList>,
    pub if_modified_since: Option<DateTime<Utc>>,
    pub if_unmodified_since: Option<DateTime<Utc>>,
}

impl Preconditions {
    /// Extract preconditions; unparsable dates are ignored
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let header = |name: HeaderName| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Self {
            if_match: header(IF_MATCH).map(|v| TagList::parse(&v)),
            if_none_match: header(IF_NONE_MATCH).map(|v| TagList::parse(&v)),
            if_modified_since: header(IF_MODIFIED_SINCE).and_then(|v| parse_http_date(&v)),
            if_unmodified_since: header(IF_UNMODIFIED_SINCE).and_then(|v| parse_http_date(&v)),
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.if_match.is_none()
            && self.if_none_match.is_none()
            && self.if_modified_since.is_none()
            && self.if_unmodified_since.is_none()
    }
}

/// Validators and freshness of a cacheable resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHeaders {
    pub etag: Option<EntityTag>,
    pub last_modified: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheHeaders {
    /// Snapshot the validators of a resource
    ///
    /// An empty tag means the resource has no entity tag.
    pub fn from_cacheable(resource: &dyn Cacheable) -> Self {
        let raw = resource.etag();
        let etag = if raw.is_empty() {
            None
        } else {
            EntityTag::parse(&raw).or_else(|| Some(EntityTag::strong(raw.replace('"', ""))))
        };
        Self {
            etag,
            last_modified: resource.last_modified(),
            ttl: resource.ttl(),
        }
    }

    /// `ETag` and `Last-Modified`, the only headers a 304 carries
    pub fn validators(&self) -> Vec<(HeaderName, String)> {
        let mut headers = Vec::with_capacity(3);
        if let Some(etag) = &self.etag {
            headers.push((ETAG, etag.to_string()));
        }
        headers.push((LAST_MODIFIED, format_http_date(self.last_modified)));
        headers
    }

    /// Validators plus `Cache-Control: max-age=<ttl>`
    pub fn headers(&self) -> Vec<(HeaderName, String)> {
        let mut headers = self.validators();
        headers.push((CACHE_CONTROL, format!("max-age={}", self.ttl.as_secs())));
        headers
    }

    fn modified_after(&self, since: DateTime<Utc>) -> bool {
        self.last_modified.timestamp() > since.timestamp()
    }
}

/// Outcome of precondition evaluation that is not a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    Proceed,
    NotModified,
}

/// Evaluate preconditions against a resource's validators
///
/// Order: `If-Match`, else `If-Unmodified-Since` (412 on failure); then
/// `If-None-Match`, else `If-Modified-Since` on GET/HEAD (304). A matching
/// `If-None-Match` on an unsafe method is a 412.
pub fn evaluate(
    method: &Method,
    preconditions: &Preconditions,
    cache: &CacheHeaders,
) -> Result<Precondition, RestError> {
    let etag = cache.etag.as_ref();

    if let Some(if_match) = &preconditions.if_match {
        if !if_match.matches(etag, true) {
            return Err(RestError::PreconditionFailed);
        }
    } else if let Some(since) = preconditions.if_unmodified_since {
        if cache.modified_after(since) {
            return Err(RestError::PreconditionFailed);
        }
    }

    let is_read = method == Method::GET || method == Method::HEAD;

    if let Some(if_none_match) = &preconditions.if_none_match {
        if if_none_match.matches(etag, false) {
            return if is_read {
                Ok(Precondition::NotModified)
            } else {
                Err(RestError::PreconditionFailed)
            };
        }
    } else if let Some(since) = preconditions.if_modified_since {
        if is_read && !cache.modified_after(since) {
            return Ok(Precondition::NotModified);
        }
    }

    Ok(Precondition::Proceed)
}

/// Parse an HTTP date (IMF-fixdate or any RFC 2822 form)
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format a timestamp as IMF-fixdate
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use restmux::http::conditional::format_http_date;
/// let t = Utc.with_ymd_and_hms(2014, 4, 14, 10, 0, 0).unwrap();
/// assert_eq!(format_http_date(t), "Mon, 14 Apr 2014 10:00:00 GMT");
/// ```
pub fn format_http_date(time: DateTime<Utc>) -> String {
    time.format(HTTP_DATE_FORMAT).to_string()
}
