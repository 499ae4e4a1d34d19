//! Route pattern parsing
//!
//! A pattern is a `/`-separated path whose segments are either literals or
//! `{name}` variables capturing one non-empty path segment.

use std::cmp::Ordering;
use std::fmt;

use super::{RouteError, RouteVars};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Variable(String),
}

impl Segment {
    const fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

/// A parsed route pattern such as `/people/{id}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Parse and validate a pattern
    ///
    /// # Examples
    /// ```
    /// use restmux::routing::Pattern;
    /// let pattern = Pattern::parse("/people/{id}").unwrap();
    /// let vars = pattern.matches("/people/42").unwrap();
    /// assert_eq!(vars.get("id"), Some("42"));
    /// assert!(pattern.matches("/people/").is_none());
    /// ```
    pub fn parse(source: &str) -> Result<Self, RouteError> {
        let Some(rest) = source.strip_prefix('/') else {
            return Err(RouteError::MissingLeadingSlash(source.to_string()));
        };

        let mut segments = Vec::new();
        if !rest.is_empty() {
            for raw in rest.split('/') {
                segments.push(parse_segment(source, raw)?);
            }
        }

        let mut names: Vec<&str> = Vec::new();
        for segment in &segments {
            if let Segment::Variable(name) = segment {
                if names.contains(&name.as_str()) {
                    return Err(RouteError::DuplicateVariable {
                        pattern: source.to_string(),
                        name: name.clone(),
                    });
                }
                names.push(name);
            }
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Match a request path, capturing variables
    ///
    /// Trailing slashes are significant and captured values are taken
    /// verbatim, without percent-decoding.
    pub fn matches(&self, path: &str) -> Option<RouteVars> {
        let rest = path.strip_prefix('/')?;
        let parts: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('/').collect()
        };
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut vars = RouteVars::default();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Variable(name) if !part.is_empty() => vars.insert(name, part),
                _ => return None,
            }
        }
        Some(vars)
    }

    /// Patterns of the same shape match exactly the same paths
    pub fn same_shape(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    (Segment::Variable(_), Segment::Variable(_)) => true,
                    _ => false,
                })
    }

    /// Specificity order: the first differing segment decides, a literal
    /// outranks a variable. `Less` means more specific.
    pub fn specificity_cmp(&self, other: &Self) -> Ordering {
        let kinds = |p: &Self| p.segments.iter().map(|s| !s.is_literal()).collect::<Vec<_>>();
        kinds(self).cmp(&kinds(other))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_segment(pattern: &str, raw: &str) -> Result<Segment, RouteError> {
    if let Some(inner) = raw.strip_prefix('{') {
        let name = inner
            .strip_suffix('}')
            .ok_or_else(|| RouteError::UnterminatedVariable(pattern.to_string()))?;
        if name.is_empty() {
            return Err(RouteError::EmptyVariable(pattern.to_string()));
        }
        if name.contains(['{', '}']) {
            return Err(RouteError::UnterminatedVariable(pattern.to_string()));
        }
        return Ok(Segment::Variable(name.to_string()));
    }
    if raw.contains(['{', '}']) {
        return Err(RouteError::UnterminatedVariable(pattern.to_string()));
    }
    Ok(Segment::Literal(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_segments() {
        let pattern = Pattern::parse("/employers/{company}/staff").unwrap();
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Literal("employers".to_string()),
                Segment::Variable("company".to_string()),
                Segment::Literal("staff".to_string()),
            ]
        );
        assert!(Pattern::parse("/").unwrap().segments().is_empty());
    }

    #[test]
    fn test_parse_rejects() {
        assert!(matches!(
            Pattern::parse("people"),
            Err(RouteError::MissingLeadingSlash(_))
        ));
        assert!(matches!(
            Pattern::parse("/people/{}"),
            Err(RouteError::EmptyVariable(_))
        ));
        assert!(matches!(
            Pattern::parse("/people/{id"),
            Err(RouteError::UnterminatedVariable(_))
        ));
        assert!(matches!(
            Pattern::parse("/a/{id}/b/{id}"),
            Err(RouteError::DuplicateVariable { .. })
        ));
    }

    #[test]
    fn test_matches() {
        let pattern = Pattern::parse("/people/{id}").unwrap();
        assert_eq!(pattern.matches("/people/7").unwrap().get("id"), Some("7"));
        assert!(pattern.matches("/people").is_none());
        assert!(pattern.matches("/people/7/").is_none());
        assert!(pattern.matches("/persons/7").is_none());

        let root = Pattern::parse("/").unwrap();
        assert!(root.matches("/").is_some());
        assert!(root.matches("/x").is_none());
    }

    #[test]
    fn test_values_not_decoded() {
        let pattern = Pattern::parse("/employers/{company}").unwrap();
        let vars = pattern.matches("/employers/Acme%20Inc").unwrap();
        assert_eq!(vars.get("company"), Some("Acme%20Inc"));
    }

    #[test]
    fn test_specificity() {
        let literal = Pattern::parse("/people/me").unwrap();
        let variable = Pattern::parse("/people/{id}").unwrap();
        assert_eq!(literal.specificity_cmp(&variable), Ordering::Less);
        assert_eq!(variable.specificity_cmp(&literal), Ordering::Greater);
        assert!(variable.same_shape(&Pattern::parse("/people/{name}").unwrap()));
        assert!(!variable.same_shape(&literal));
    }
}
