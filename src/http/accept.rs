//! Content negotiation module
//!
//! Parses `Accept` into ranked media preferences and picks the best of the
//! media types a resource offers.
//!
//! Each offered type is governed by the most specific preference that
//! matches it (`type/subtype` > `type/*` > `*/*`), so `text/html;q=0, */*`
//! excludes HTML while accepting everything else. Among acceptable types the
//! highest quality wins, then the governing preference that appears earliest
//! in the header, then the type the resource offered first.

use std::cmp::Reverse;

use hyper::header::ACCEPT;
use hyper::Request;

use super::mime::{MatchLevel, MediaRange, Specificity};

/// Quality values are kept in thousandths, as the grammar allows three decimals.
const MAX_QUALITY: u16 = 1000;

/// One entry of an `Accept` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPreference {
    range: MediaRange,
    quality: u16,
    order: usize,
}

impl MediaPreference {
    pub const fn range(&self) -> &MediaRange {
        &self.range
    }

    pub fn quality(&self) -> f32 {
        f32::from(self.quality) / f32::from(MAX_QUALITY)
    }

    /// Position in the header, used as the secondary tie-break
    pub const fn order(&self) -> usize {
        self.order
    }
}

/// Parsed `Accept` header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accept {
    preferences: Vec<MediaPreference>,
    /// A non-blank header was sent, even if none of it parsed
    present: bool,
}

impl Accept {
    /// Parse an `Accept` header value
    ///
    /// Malformed entries are skipped. A missing or invalid `q` counts as 1.
    /// A non-blank header whose entries are all malformed accepts nothing.
    ///
    /// # Examples
    /// ```
    /// use restmux::http::accept::Accept;
    /// let accept = Accept::parse("text/html;q=0.5, application/json");
    /// assert_eq!(
    ///     accept.negotiate(&["text/html", "application/json"]),
    ///     Some("application/json")
    /// );
    /// ```
    pub fn parse(header: &str) -> Self {
        let preferences = header
            .split(',')
            .filter_map(|entry| MediaRange::parse(entry.trim()))
            .enumerate()
            .map(|(order, mut range)| {
                let quality = range
                    .take_param("q")
                    .and_then(|q| parse_quality(&q))
                    .unwrap_or(MAX_QUALITY);
                MediaPreference {
                    range,
                    quality,
                    order,
                }
            })
            .collect();
        Self {
            preferences,
            present: !header.trim().is_empty(),
        }
    }

    /// Read `Accept` from a request; an absent header accepts anything
    pub fn from_request<B>(req: &Request<B>) -> Self {
        req.headers()
            .get(ACCEPT)
            .map_or_else(Self::default, |v| match v.to_str() {
                Ok(header) => Self::parse(header),
                Err(_) => Self {
                    preferences: Vec::new(),
                    present: true,
                },
            })
    }

    pub fn is_empty(&self) -> bool {
        self.preferences.is_empty()
    }

    /// False for an absent or blank header, which accepts anything
    pub const fn is_present(&self) -> bool {
        self.present
    }

    pub fn preferences(&self) -> &[MediaPreference] {
        &self.preferences
    }

    /// Pick the best of `offered`, or `None` when nothing is acceptable
    ///
    /// Without a header the first offered type is chosen.
    pub fn negotiate<'a>(&self, offered: &[&'a str]) -> Option<&'a str> {
        if !self.present {
            return offered.first().copied();
        }

        offered
            .iter()
            .enumerate()
            .filter_map(|(idx, candidate)| {
                let parsed = MediaRange::parse(candidate)?;
                let (pref, _) = self.governing(&parsed)?;
                (pref.quality > 0).then_some((
                    (pref.quality, Reverse(pref.order), Reverse(idx)),
                    *candidate,
                ))
            })
            .max_by_key(|(score, _)| *score)
            .map(|(_, candidate)| candidate)
    }

    /// Quality the client assigns to `media_type`, if it accepts it at all
    pub fn quality_of(&self, media_type: &str) -> Option<f32> {
        if !self.present {
            return Some(1.0);
        }
        let parsed = MediaRange::parse(media_type)?;
        self.governing(&parsed)
            .filter(|(pref, _)| pref.quality > 0)
            .map(|(pref, _)| pref.quality())
    }

    /// True when the client names `media_type` itself, not via a wildcard
    ///
    /// This is the check resources use to force a fixed representation.
    pub fn accepts_exactly(&self, media_type: &str) -> bool {
        MediaRange::parse(media_type)
            .and_then(|parsed| self.governing(&parsed))
            .is_some_and(|(pref, spec)| spec.level == MatchLevel::Exact && pref.quality > 0)
    }

    /// Most specific matching preference; earlier entries win ties
    fn governing(&self, candidate: &MediaRange) -> Option<(&MediaPreference, Specificity)> {
        self.preferences
            .iter()
            .filter_map(|pref| pref.range.matches(candidate).map(|spec| (pref, spec)))
            .max_by_key(|(pref, spec)| (*spec, Reverse(pref.order)))
    }
}

/// Parse a qvalue (`0`, `0.5`, `1.000`) into thousandths
fn parse_quality(value: &str) -> Option<u16> {
    let (whole, frac) = value.trim().split_once('.').unwrap_or((value.trim(), ""));
    if frac.len() > 3 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let whole = match whole {
        "0" => 0,
        "1" => MAX_QUALITY,
        _ => return None,
    };
    let frac = frac
        .bytes()
        .zip([100u16, 10, 1])
        .map(|(digit, scale)| u16::from(digit - b'0') * scale)
        .sum::<u16>();
    Some((whole + frac).min(MAX_QUALITY))
}
