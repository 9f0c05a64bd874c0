//! Consul-style service hostname parsing.
//!
//! [`parse`] turns hostnames such as `grafana.service.consul` or
//! `_grafana._http.service.dc1.consul` into a [`ServiceAddress`]. The
//! datacenter segment after `.service.` is ignored: directory queries are
//! datacenter-agnostic.

const SERVICE_MARKER: &str = ".service.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAddress {
    pub service_name: String,
    /// Empty means any port type.
    pub port_type: String,
}

impl ServiceAddress {
    #[must_use]
    pub fn has_port_type(&self) -> bool {
        !self.port_type.is_empty()
    }
}

/// Parse `hostname` as a service address, stripping `.{suffix}` first when a
/// cluster suffix is configured. Returns `None` for anything that is not a
/// service address.
#[must_use]
pub fn parse(hostname: &str, suffix: Option<&str>) -> Option<ServiceAddress> {
    let hostname = suffix
        .and_then(|s| strip_cluster_suffix(hostname, s))
        .unwrap_or(hostname);

    let (left, _datacenter) = hostname.split_once(SERVICE_MARKER)?;

    let (service_name, port_type) = match left.split_once('.') {
        Some((name, port_type)) => (strip_underscore(name), strip_underscore(port_type)),
        None => (left, ""),
    };

    // Literal addresses like 10.0.0.1.service.x leave dots in the port type
    if service_name.is_empty() || !is_label(service_name) || !is_label(port_type) {
        return None;
    }

    Some(ServiceAddress {
        service_name: service_name.to_string(),
        port_type: port_type.to_string(),
    })
}

/// Returns `hostname` without a trailing `.{suffix}`, or `None` when the
/// suffix is empty or absent.
#[must_use]
pub fn strip_cluster_suffix<'a>(hostname: &'a str, suffix: &str) -> Option<&'a str> {
    let suffix = suffix.trim_start_matches('.');
    if suffix.is_empty() {
        return None;
    }
    hostname
        .strip_suffix(suffix)
        .and_then(|rest| rest.strip_suffix('.'))
        .filter(|rest| !rest.is_empty())
}

/// Service names and port types are plain DNS-ish labels: `[A-Za-z0-9_-]`.
fn is_label(s: &str) -> bool {
    s.bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

fn strip_underscore(s: &str) -> &str {
    s.strip_prefix('_').unwrap_or(s)
}
