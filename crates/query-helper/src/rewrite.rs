//! Column Path Rewriter: turns `property.column` paths that address a
//! whole-table mapping's target property into `alias.column` paths.

use std::borrow::Cow;

#[derive(Debug, Clone, Default)]
pub struct PathRewriter {
    targets: Vec<(String, String)>,
}

impl PathRewriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `property` to `qualifier`. The first registration of a property wins.
    pub fn register(&mut self, property: &str, qualifier: &str) {
        if self.qualifier_for(property).is_none() {
            self.targets
                .push((property.to_string(), qualifier.to_string()));
        }
    }

    pub fn qualifier_for(&self, property: &str) -> Option<&str> {
        self.targets
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, q)| q.as_str())
    }

    /// Returns the path with its first segment replaced when that segment is
    /// a registered property. Paths without a dot and unknown first segments
    /// come back unchanged.
    pub fn rewrite<'p>(&self, path: &'p str) -> Cow<'p, str> {
        let Some((head, rest)) = path.split_once('.') else {
            return Cow::Borrowed(path);
        };
        match self.qualifier_for(head) {
            Some(qualifier) => Cow::Owned(format!("{qualifier}.{rest}")),
            None => Cow::Borrowed(path),
        }
    }
}
