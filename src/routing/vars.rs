//! Captured route variables

/// Variables captured from the path, in pattern order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteVars {
    vars: Vec<(String, String)>,
}

impl RouteVars {
    pub(crate) fn insert(&mut self, name: &str, value: &str) {
        self.vars.push((name.to_string(), value.to_string()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for RouteVars {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut vars = Self::default();
        for (name, value) in iter {
            vars.insert(name, value);
        }
        vars
    }
}
