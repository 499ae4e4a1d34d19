//! Range request module
//!
//! Parses `Range: <unit>=<spec>` headers and resolves them against a
//! resource's element count, in the spirit of RFC 7233 but for any unit a
//! resource declares (`bytes`, `items`, ...).

use std::fmt;

use hyper::header::{IF_RANGE, RANGE};
use hyper::Request;
use serde::{Deserialize, Serialize};

use super::conditional::{parse_http_date, CacheHeaders, EntityTag};
use crate::error::RestError;
use crate::resource::Rangeable;

/// A validated, inclusive range: `from <= to < count`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub unit: String,
    pub from: u64,
    pub to: u64,
}

impl Range {
    /// Number of elements covered
    pub const fn span(&self) -> u64 {
        self.to - self.from + 1
    }
}

/// The bounds as written in the header, before resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpec {
    /// `from-to`
    Closed { from: u64, to: u64 },
    /// `from-`
    From(u64),
    /// `-n`, the last n elements
    Suffix(u64),
}

/// Parsed `Range` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRequest {
    pub unit: String,
    pub spec: RangeSpec,
}

impl RangeRequest {
    /// Parse a `Range` header value (first range only)
    ///
    /// # Examples
    /// ```
    /// use restmux::http::range::{RangeRequest, RangeSpec};
    /// let req = RangeRequest::parse("items=0-9").unwrap();
    /// assert_eq!(req.unit, "items");
    /// assert_eq!(req.spec, RangeSpec::Closed { from: 0, to: 9 });
    /// assert!(RangeRequest::parse("items").is_none());
    /// ```
    pub fn parse(header: &str) -> Option<Self> {
        let (unit, set) = header.trim().split_once('=')?;
        let unit = unit.trim();
        if unit.is_empty() {
            return None;
        }

        // Multi-range requests are served as their first range
        let first = set.split(',').next()?.trim();
        let (start, end) = first.split_once('-')?;
        let (start, end) = (start.trim(), end.trim());

        let spec = match (start.is_empty(), end.is_empty()) {
            (true, true) => return None,
            (true, false) => RangeSpec::Suffix(end.parse().ok()?),
            (false, true) => RangeSpec::From(start.parse().ok()?),
            (false, false) => RangeSpec::Closed {
                from: start.parse().ok()?,
                to: end.parse().ok()?,
            },
        };

        Some(Self {
            unit: unit.to_string(),
            spec,
        })
    }

    /// Resolve against `count` elements; `None` when unsatisfiable
    ///
    /// `to` is clamped to the last element, a suffix longer than the
    /// resource selects all of it.
    pub fn resolve(&self, count: u64) -> Option<Range> {
        let last = count.checked_sub(1)?;
        let (from, to) = match self.spec {
            RangeSpec::Closed { from, to } => (from, to.min(last)),
            RangeSpec::From(from) => (from, last),
            RangeSpec::Suffix(0) => return None,
            RangeSpec::Suffix(n) => (count.saturating_sub(n), last),
        };
        if from > to || from >= count {
            return None;
        }
        Some(Range {
            unit: self.unit.clone(),
            from,
            to,
        })
    }
}

/// Range actually served, echoed in `Content-Range`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRange {
    pub range: Range,
    pub count: u64,
}

impl fmt::Display for ContentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{}/{}",
            self.range.unit, self.range.from, self.range.to, self.count
        )
    }
}

/// What to do with `Range` when the request also carries `If-Range`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IfRangePolicy {
    /// Honour `Range` only if `If-Range` matches the current validators
    #[default]
    Evaluate,
    /// Always honour `Range`
    Ignore,
}

/// Decide whether `Range` stays in force given `If-Range`
///
/// Under [`IfRangePolicy::Evaluate`] an entity tag must match strongly and a
/// date must equal `Last-Modified`; a resource without validators never
/// matches.
pub fn if_range_permits(
    policy: IfRangePolicy,
    if_range: Option<&str>,
    cache: Option<&CacheHeaders>,
) -> bool {
    let Some(if_range) = if_range else {
        return true;
    };
    if policy == IfRangePolicy::Ignore {
        return true;
    }
    let Some(cache) = cache else {
        return false;
    };

    if let Some(date) = parse_http_date(if_range) {
        return date.timestamp() == cache.last_modified.timestamp();
    }
    match (EntityTag::parse(if_range), &cache.etag) {
        (Some(tag), Some(current)) => tag.strong_eq(current),
        _ => false,
    }
}

/// Validate the request's `Range` against a rangeable resource
///
/// Returns `Ok(None)` when there is no `Range` header or `If-Range` voids it.
pub fn evaluate<B>(
    req: &Request<B>,
    rangeable: &dyn Rangeable,
    cache: Option<&CacheHeaders>,
    policy: IfRangePolicy,
) -> Result<Option<Range>, RestError> {
    let Some(header) = req.headers().get(RANGE) else {
        return Ok(None);
    };
    let if_range = req.headers().get(IF_RANGE).and_then(|v| v.to_str().ok());
    if !if_range_permits(policy, if_range, cache) {
        tracing::debug!("If-Range does not match, serving full representation");
        return Ok(None);
    }

    let unit = rangeable.range_unit();
    let request = header
        .to_str()
        .ok()
        .and_then(RangeRequest::parse)
        .ok_or_else(|| RestError::MalformedRange {
            unit: unit.to_string(),
        })?;

    if !request.unit.eq_ignore_ascii_case(unit) {
        return Err(RestError::UnsupportedRangeUnit {
            unit: unit.to_string(),
        });
    }

    let count = rangeable.count();
    let mut range = request
        .resolve(count)
        .ok_or_else(|| RestError::RangeNotSatisfiable {
            unit: unit.to_string(),
            count,
        })?;
    range.unit = unit.to_string();
    Ok(Some(range))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn closed(from: u64, to: u64) -> RangeRequest {
        RangeRequest {
            unit: "items".to_string(),
            spec: RangeSpec::Closed { from, to },
        }
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(
            RangeRequest::parse("items=50-").unwrap().spec,
            RangeSpec::From(50)
        );
        assert_eq!(
            RangeRequest::parse("bytes=-20").unwrap().spec,
            RangeSpec::Suffix(20)
        );
        assert_eq!(
            RangeRequest::parse("items=0-9, 20-29").unwrap().spec,
            RangeSpec::Closed { from: 0, to: 9 }
        );
    }

    #[test]
    fn test_parse_malformed() {
        assert!(RangeRequest::parse("=0-9").is_none());
        assert!(RangeRequest::parse("items=a-b").is_none());
        assert!(RangeRequest::parse("items=-").is_none());
        assert!(RangeRequest::parse("items=5").is_none());
    }

    #[test]
    fn test_resolve_full() {
        let range = closed(0, 99).resolve(100).unwrap();
        assert_eq!((range.from, range.to, range.span()), (0, 99, 100));
    }

    #[test]
    fn test_resolve_clamps_end() {
        let range = closed(90, 500).resolve(100).unwrap();
        assert_eq!((range.from, range.to), (90, 99));
    }

    #[test]
    fn test_resolve_unsatisfiable() {
        assert!(closed(100, 100).resolve(100).is_none());
        assert!(closed(5, 4).resolve(100).is_none());
        assert!(closed(0, 0).resolve(0).is_none());
        let suffix = RangeRequest {
            unit: "items".to_string(),
            spec: RangeSpec::Suffix(0),
        };
        assert!(suffix.resolve(10).is_none());
    }

    #[test]
    fn test_resolve_suffix() {
        let suffix = RangeRequest {
            unit: "items".to_string(),
            spec: RangeSpec::Suffix(20),
        };
        let range = suffix.resolve(100).unwrap();
        assert_eq!((range.from, range.to), (80, 99));
        let range = suffix.resolve(5).unwrap();
        assert_eq!((range.from, range.to), (0, 4));
    }

    #[test]
    fn test_content_range_display() {
        let cr = ContentRange {
            range: closed(0, 9).resolve(100).unwrap(),
            count: 100,
        };
        assert_eq!(cr.to_string(), "items 0-9/100");
    }

    #[test]
    fn test_if_range() {
        let cache = CacheHeaders {
            etag: Some(EntityTag::strong("v1")),
            last_modified: Utc.with_ymd_and_hms(2014, 4, 14, 10, 0, 0).unwrap(),
            ttl: Duration::ZERO,
        };
        let policy = IfRangePolicy::Evaluate;
        assert!(if_range_permits(policy, None, Some(&cache)));
        assert!(if_range_permits(policy, Some("\"v1\""), Some(&cache)));
        assert!(!if_range_permits(policy, Some("\"v0\""), Some(&cache)));
        assert!(!if_range_permits(policy, Some("W/\"v1\""), Some(&cache)));
        assert!(if_range_permits(
            policy,
            Some("Mon, 14 Apr 2014 10:00:00 GMT"),
            Some(&cache)
        ));
        assert!(!if_range_permits(policy, Some("\"v1\""), None));
        assert!(if_range_permits(
            IfRangePolicy::Ignore,
            Some("\"v0\""),
            Some(&cache)
        ));
    }
}
