//! Turning a matched custom route into a redirect URL.
//!
//! The target's scheme and authority always replace the request's. What
//! happens to the path depends on the template:
//!
//! - `$arg$` present: the request path beyond the matched key is the arg
//!   value, substituted into the template path and query.
//! - a non-trivial template path: it is prefixed onto the remaining path.
//! - otherwise the remaining request path passes through.
//!
//! The request query is always kept, after any query the template brings.

use url::Url;

use super::{MatchKind, RouteMatch};
use crate::error::TemplateError;
use crate::rewrite::rewrite;

pub const ARG_TOKEN: &str = "$arg$";

/// Replace every `$arg$` in `template` with `arg`.
#[must_use]
pub fn substitute_arg(template: &str, arg: &str) -> String {
    template.replace(ARG_TOKEN, arg)
}

/// Parse a route target, requiring an absolute URL with a host.
pub fn parse_target(template: &str) -> Result<Url, TemplateError> {
    let target = Url::parse(template).map_err(|source| TemplateError::InvalidUrl {
        template: template.to_string(),
        source,
    })?;
    if target.host_str().is_none() {
        return Err(TemplateError::MissingHost(template.to_string()));
    }
    Ok(target)
}

pub fn apply(route: &RouteMatch<'_>, request: &Url) -> Result<Url, TemplateError> {
    let target = parse_target(route.template)?;
    let host = target
        .host_str()
        .ok_or_else(|| TemplateError::MissingHost(route.template.to_string()))?;
    let authority = match target.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    let mut out = rewrite(request, &authority, target.scheme(), None)?;

    let request_path = request.path();
    let remaining = match route.kind {
        MatchKind::Host => request_path,
        MatchKind::FullPath => "",
        MatchKind::FirstSegment => route
            .key_path()
            .and_then(|segment| request_path.strip_prefix(&format!("/{segment}")))
            .unwrap_or(request_path),
    };

    let (path, query) = if route.template.contains(ARG_TOKEN) {
        let arg = remaining.trim_start_matches('/');
        let query = target.query().map(|q| substitute_arg(q, arg));
        (
            substitute_arg(target.path(), arg),
            join_query(query.as_deref(), request.query()),
        )
    } else if target.path().len() > 1 {
        let prefix = if remaining.starts_with('/') {
            target.path().trim_end_matches('/')
        } else {
            target.path()
        };
        (
            format!("{prefix}{remaining}"),
            join_query(target.query(), request.query()),
        )
    } else {
        (
            remaining.to_string(),
            join_query(target.query(), request.query()),
        )
    };

    out.set_path(&path);
    out.set_query(query.as_deref());
    Ok(out)
}

fn join_query(first: Option<&str>, second: Option<&str>) -> Option<String> {
    let first = first.filter(|q| !q.is_empty());
    let second = second.filter(|q| !q.is_empty());
    match (first, second) {
        (Some(a), Some(b)) => Some(format!("{a}&{b}")),
        (Some(q), None) | (None, Some(q)) => Some(q.to_string()),
        (None, None) => None,
    }
}
