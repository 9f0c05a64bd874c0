//! Route table validation with detailed error reporting.
//!
//! A bad template never stops the server (it renders a 500 for the
//! affected route only), so [`validate`] is used for startup warnings and
//! for `signpost validate`.

use crate::error::ValidationError;
use crate::routes::template::{parse_target, ARG_TOKEN};
use crate::routes::RouteTable;

/// Validate a route key. Returns `Ok(())` or a human-readable error.
pub fn validate_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("key cannot be empty".into());
    }
    if key.starts_with('/') {
        return Err("key must start with a hostname".into());
    }
    if key.contains("://") {
        return Err("key must be a hostname, not a URL".into());
    }
    Ok(())
}

/// Validate a target template. Returns `Ok(())` or a human-readable error.
pub fn validate_target(template: &str) -> Result<(), String> {
    let parsed = parse_target(template).map_err(|e| e.to_string())?;
    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(format!(
            "unsupported scheme '{scheme}' (expected http or https)"
        ));
    }
    if parsed.host_str().is_some_and(|h| h.contains(ARG_TOKEN)) {
        return Err(format!("{ARG_TOKEN} is only substituted in the path and query"));
    }
    Ok(())
}

pub fn validate(routes: &RouteTable) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for entry in routes.entries() {
        if let Err(message) = validate_key(&entry.key) {
            let suggestion = entry
                .key
                .split_once("://")
                .map(|(_, rest)| format!("did you mean '{rest}'?"));
            errors.push(ValidationError {
                key: entry.key.clone(),
                message,
                suggestion,
            });
        }

        if let Err(message) = validate_target(&entry.target_template) {
            let suggestion = (!entry.target_template.contains("://"))
                .then(|| format!("did you mean 'http://{}'?", entry.target_template));
            errors.push(ValidationError {
                key: entry.key,
                message,
                suggestion,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[must_use]
pub fn format_validation_report(origin: &str, routes: &RouteTable) -> String {
    let mut lines = vec![format!("  {} routes\n", routes.len())];
    for entry in routes.entries() {
        let templated = if entry.target_template.contains(ARG_TOKEN) {
            "  (templated)"
        } else {
            ""
        };
        lines.push(format!("  {}  -> {}{templated}", entry.key, entry.target_template));
    }
    format!("{} is valid\n{}", origin, lines.join("\n"))
}
