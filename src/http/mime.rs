//! Media type parsing module
//!
//! Parses `type/subtype; param=value` strings and matches media ranges
//! (including `*/*` and `type/*`) against concrete media types.

/// JSON media type, the canonical representation of most resources
pub const APPLICATION_JSON: &str = "application/json";
/// Plain text media type
pub const TEXT_PLAIN: &str = "text/plain";

/// How precisely a media range matched a concrete type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchLevel {
    /// `*/*`
    Any,
    /// `type/*`
    Type,
    /// `type/subtype`
    Exact,
}

/// Outcome of matching a range against a type; more specific compares greater
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity {
    pub level: MatchLevel,
    pub params: usize,
}

/// A parsed media range or media type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRange {
    main: String,
    sub: String,
    params: Vec<(String, String)>,
}

impl MediaRange {
    /// Parse a media range, e.g. `text/html; level=1`
    ///
    /// A lone `*` is accepted as `*/*`. Returns `None` for anything without
    /// a `/` separator or with an empty type.
    ///
    /// # Examples
    /// ```
    /// use restmux::http::mime::MediaRange;
    /// let range = MediaRange::parse("Text/HTML; charset=UTF-8").unwrap();
    /// assert_eq!(range.essence(), "text/html");
    /// assert!(MediaRange::parse("nonsense").is_none());
    /// ```
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.split(';');
        let essence = parts.next()?.trim();
        let (main, sub) = if essence == "*" {
            ("*", "*")
        } else {
            essence.split_once('/')?
        };
        let (main, sub) = (main.trim(), sub.trim());
        if main.is_empty() || sub.is_empty() || (main == "*" && sub != "*") {
            return None;
        }

        let params = parts
            .filter_map(|p| {
                let (name, value) = p.split_once('=')?;
                let name = name.trim().to_ascii_lowercase();
                if name.is_empty() {
                    return None;
                }
                Some((name, value.trim().trim_matches('"').to_string()))
            })
            .collect();

        Some(Self {
            main: main.to_ascii_lowercase(),
            sub: sub.to_ascii_lowercase(),
            params,
        })
    }

    /// `type/subtype` without parameters, lowercased
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main, self.sub)
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Remove and return a parameter (used to pull `q` out of a preference)
    pub fn take_param(&mut self, name: &str) -> Option<String> {
        let idx = self.params.iter().position(|(n, _)| n == name)?;
        Some(self.params.remove(idx).1)
    }

    pub fn is_wildcard(&self) -> bool {
        self.main == "*" || self.sub == "*"
    }

    /// Match this range against a concrete media type
    ///
    /// Every parameter of the range must be present on the candidate with an
    /// equal value; parameters only the candidate carries are ignored.
    pub fn matches(&self, candidate: &Self) -> Option<Specificity> {
        let level = if self.main == "*" {
            MatchLevel::Any
        } else if self.main != candidate.main {
            return None;
        } else if self.sub == "*" {
            MatchLevel::Type
        } else if self.sub == candidate.sub {
            MatchLevel::Exact
        } else {
            return None;
        };

        let params_ok = self.params.iter().all(|(name, value)| {
            candidate
                .params
                .iter()
                .any(|(n, v)| n == name && v.eq_ignore_ascii_case(value))
        });

        params_ok.then_some(Specificity {
            level,
            params: self.params.len(),
        })
    }
}

/// Lowercased `type/subtype` of a `Content-Type` value, parameters dropped
pub fn essence_of(content_type: &str) -> Option<String> {
    MediaRange::parse(content_type)
        .filter(|m| !m.is_wildcard())
        .map(|m| m.essence())
}
