//! Output URL construction.
//!
//! [`rewrite`] keeps the path, query and fragment of the request URL and
//! swaps in a new scheme and authority. It holds no state and is safe to
//! call from any number of tasks.

use url::Url;

use crate::error::RewriteError;

/// Rebuild `base` against `target_host`.
///
/// With a port the authority becomes `target_host:port`; without one
/// `target_host` is used verbatim, so it may carry its own `:port`.
pub fn rewrite(
    base: &Url,
    target_host: &str,
    scheme: &str,
    port: Option<u16>,
) -> Result<Url, RewriteError> {
    let authority = match port {
        Some(port) => format!("{target_host}:{port}"),
        None => target_host.to_string(),
    };

    let mut attempted = format!("{scheme}://{authority}{}", base.path());
    if let Some(query) = base.query() {
        attempted.push('?');
        attempted.push_str(query);
    }
    if let Some(fragment) = base.fragment() {
        attempted.push('#');
        attempted.push_str(fragment);
    }

    Url::parse(&attempted).map_err(|source| RewriteError { attempted, source })
}

/// Strip a trailing `:port` from a `Host` header value. Bracketed IPv6
/// literals keep their brackets.
#[must_use]
pub fn bare_hostname(host_header: &str) -> &str {
    if host_header.starts_with('[') {
        return match host_header.find(']') {
            Some(end) => &host_header[..=end],
            None => host_header,
        };
    }
    host_header
        .split_once(':')
        .map_or(host_header, |(host, _port)| host)
}
