//! Operator-defined custom routes.
//!
//! A [`RouteTable`] maps keys (`host`, `host/segment` or `host/full/path`)
//! to target URL templates. [`RouteTable::resolve`] picks the most specific
//! key for a request and [`template::apply`] turns the match into the
//! redirect URL. The table is built once at startup and never mutated.

pub mod template;

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub key: String,
    pub target_template: String,
}

/// Which key form matched a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// `host` followed by the whole request path.
    FullPath,
    /// `host/first-segment` with more path after it.
    FirstSegment,
    /// The bare hostname.
    Host,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub key: &'a str,
    pub template: &'a str,
    pub kind: MatchKind,
}

impl RouteMatch<'_> {
    /// The path part of the matched key, without its leading `/`.
    #[must_use]
    pub fn key_path(&self) -> Option<&str> {
        self.key.split_once('/').map(|(_, path)| path)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    routes: BTreeMap<String, String>,
}

impl RouteTable {
    #[must_use]
    pub fn new(routes: BTreeMap<String, String>) -> Self {
        Self { routes }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = RouteEntry> + '_ {
        self.routes.iter().map(|(key, target)| RouteEntry {
            key: key.clone(),
            target_template: target.clone(),
        })
    }

    /// Merge `other` into this table; keys already present are replaced.
    pub fn extend(&mut self, other: Self) {
        self.routes.extend(other.routes);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.routes.get(key).map(String::as_str)
    }

    /// Find the route for `hostname` and `path`.
    ///
    /// Tried in order: `{hostname}{path}`, `{hostname}/{first segment}` when
    /// the path has at least two segments, then `{hostname}`.
    #[must_use]
    pub fn resolve(&self, hostname: &str, path: &str) -> Option<RouteMatch<'_>> {
        if let Some(found) = self.lookup(format!("{hostname}{path}"), MatchKind::FullPath) {
            return Some(found);
        }

        // "/a/b" splits into ["", "a", "b"]
        let segments: Vec<&str> = path.split('/').collect();
        if segments.len() > 2 {
            let key = format!("{hostname}/{}", segments[1]);
            if let Some(found) = self.lookup(key, MatchKind::FirstSegment) {
                return Some(found);
            }
        }

        self.lookup(hostname.to_string(), MatchKind::Host)
    }

    fn lookup(&self, key: String, kind: MatchKind) -> Option<RouteMatch<'_>> {
        self.routes
            .get_key_value(&key)
            .map(|(key, template)| RouteMatch {
                key,
                template,
                kind,
            })
    }
}

impl FromIterator<(String, String)> for RouteTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &str)]) -> RouteTable {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn bare_host_match() {
        let t = table(&[("h", "http://home:1234")]);
        let m = t.resolve("h", "/anything/here").unwrap();
        assert_eq!(m.key, "h");
        assert_eq!(m.kind, MatchKind::Host);
        assert_eq!(m.key_path(), None);
    }

    #[test]
    fn full_path_beats_segment_and_host() {
        let t = table(&[
            ("h", "http://a"),
            ("h/grafana", "http://b"),
            ("h/grafana/overview", "http://c"),
        ]);
        let m = t.resolve("h", "/grafana/overview").unwrap();
        assert_eq!(m.template, "http://c");
        assert_eq!(m.kind, MatchKind::FullPath);
    }

    #[test]
    fn first_segment_beats_host() {
        let t = table(&[("h", "http://a"), ("h/grafana", "http://b")]);
        let m = t.resolve("h", "/grafana/foo").unwrap();
        assert_eq!(m.template, "http://b");
        assert_eq!(m.kind, MatchKind::FirstSegment);
        assert_eq!(m.key_path(), Some("grafana"));
    }

    #[test]
    fn single_segment_path_matches_as_full_path() {
        let t = table(&[("h/grafana", "http://b")]);
        let m = t.resolve("h", "/grafana").unwrap();
        assert_eq!(m.kind, MatchKind::FullPath);
    }

    #[test]
    fn unknown_host_has_no_match() {
        let t = table(&[("h", "http://a")]);
        assert!(t.resolve("other", "/").is_none());
        assert!(t.resolve("other", "/h").is_none());
    }

    #[test]
    fn extend_overrides_existing_keys() {
        let mut t = table(&[("h", "http://a"), ("g", "http://g")]);
        t.extend(table(&[("h", "http://b")]));
        assert_eq!(t.get("h"), Some("http://b"));
        assert_eq!(t.len(), 2);
    }
}
