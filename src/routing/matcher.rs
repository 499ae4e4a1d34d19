//! Route matching module
//!
//! Routes are kept ordered by specificity so that a linear scan returns the
//! most specific match. Equally specific routes keep registration order and
//! the first one found wins.

use super::pattern::Pattern;
use super::{RouteError, RouteVars};

struct Route<T> {
    pattern: Pattern,
    target: T,
}

/// Ordered pattern table mapping paths to targets
pub struct RouteTable<T> {
    routes: Vec<Route<T>>,
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<T> RouteTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route; patterns that would shadow an existing one are rejected
    pub fn insert(&mut self, pattern: &str, target: T) -> Result<(), RouteError> {
        let pattern = Pattern::parse(pattern)?;
        if let Some(existing) = self.routes.iter().find(|r| r.pattern.same_shape(&pattern)) {
            return Err(RouteError::Conflict {
                pattern: pattern.to_string(),
                existing: existing.pattern.to_string(),
            });
        }

        // After every route at least as specific, so ties keep registration order
        let at = self
            .routes
            .iter()
            .position(|r| pattern.specificity_cmp(&r.pattern).is_lt())
            .unwrap_or(self.routes.len());
        self.routes.insert(at, Route { pattern, target });
        Ok(())
    }

    /// Find the first matching route for a given path
    pub fn find(&self, path: &str) -> Option<(&T, RouteVars)> {
        self.routes
            .iter()
            .find_map(|route| route.pattern.matches(path).map(|vars| (&route.target, vars)))
    }

    /// Patterns in match order
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.pattern.as_str())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
