//! Process-wide configuration.
//!
//! [`RouterConfig`] is assembled once at startup from CLI flags and the
//! custom route sources, then shared read-only behind an `Arc`. Nothing
//! mutates it afterwards. Submodules parse route tables ([`sources`]) and
//! check them for mistakes ([`validation`]).

pub mod sources;
pub mod validation;

use std::path::Path;
use std::time::Duration;

use crate::address::strip_cluster_suffix;
use crate::error::SignpostError;
use crate::routes::RouteTable;

pub const DEFAULT_DIRECTORY_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Cluster domain, stored without a leading dot.
    pub hostname_suffix: Option<String>,
    pub nomad_ui_hostname: Option<String>,
    pub consul_ui_hostname: Option<String>,
    pub redirect_to_nomad_ui: bool,
    pub directory_timeout: Duration,
    pub routes: RouteTable,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            hostname_suffix: None,
            nomad_ui_hostname: None,
            consul_ui_hostname: None,
            redirect_to_nomad_ui: false,
            directory_timeout: Duration::from_millis(DEFAULT_DIRECTORY_TIMEOUT_MS),
            routes: RouteTable::default(),
        }
    }
}

impl RouterConfig {
    #[must_use]
    pub fn with_hostname_suffix(mut self, suffix: Option<String>) -> Self {
        self.hostname_suffix = non_empty(suffix.map(|s| s.trim_matches('.').to_string()));
        self
    }

    #[must_use]
    pub fn suffix(&self) -> Option<&str> {
        self.hostname_suffix.as_deref()
    }

    /// `hostname` with `.{suffix}` removed, if it carries it.
    #[must_use]
    pub fn strip_suffix<'a>(&self, hostname: &'a str) -> Option<&'a str> {
        self.suffix()
            .and_then(|suffix| strip_cluster_suffix(hostname, suffix))
    }

    /// Append the cluster suffix to a directory node name.
    #[must_use]
    pub fn with_suffix(&self, node: &str) -> String {
        match self.suffix() {
            Some(suffix) => format!("{node}.{suffix}"),
            None => node.to_string(),
        }
    }

    /// Whether `hostname` should jump straight to the Nomad UI.
    #[must_use]
    pub fn is_nomad_ui_host(&self, hostname: &str) -> bool {
        self.redirect_to_nomad_ui
            && (self.strip_suffix(hostname).is_some()
                || self.nomad_ui_hostname.as_deref() == Some(hostname))
    }
}

/// Treat empty strings from flags and env vars as unset.
#[must_use]
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Build the route table from the inline JSON flag and an optional file.
/// File entries win on key collisions.
pub async fn load_routes(
    inline: &str,
    file: Option<&Path>,
) -> Result<RouteTable, SignpostError> {
    let mut routes = sources::parse_inline(inline)?;
    if let Some(path) = file {
        routes.extend(sources::read_routes_file(path).await?);
    }
    Ok(routes)
}
