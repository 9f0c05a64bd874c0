//! Unified error types for Signpost.
//!
//! Defines [`SignpostError`] (process-level failures: config, startup,
//! CLI commands), [`RedirectError`] (per-request failures rendered as
//! 500 pages), and [`ValidationError`] for route-table diagnostics.
//! All use `thiserror` for `Display` and `Error` derives.

use std::path::PathBuf;

use crate::directory::DirectoryError;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub key: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  route {}: {}", self.key, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible (only fails on OOM which is unrecoverable)
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SignpostError {
    #[error("Routes file not found: {}", path.display())]
    RoutesFileNotFound { path: PathBuf },

    #[error("Custom routes parse error in {origin}:\n  {source}")]
    RoutesParse {
        origin: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Route validation failed:\n{}", format_errors(.errors))]
    RouteValidation { errors: Vec<ValidationError> },

    #[error("Unsupported routes file format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("Invalid URI: {source}")]
    UriParse {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("HTTP request failed: {source}")]
    HttpRequest {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Directory setup failed: {0}")]
    Directory(#[from] DirectoryError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Health check failed with status {0}")]
    HealthCheckFailed(http::StatusCode),
}

/// Failures while deciding a single request. Each one is local to that
/// request and is rendered as a 500 page.
#[derive(Debug, thiserror::Error)]
pub enum RedirectError {
    #[error("error processing custom route {key}: {source}")]
    Template {
        key: String,
        #[source]
        source: TemplateError,
    },

    #[error("error building URL for {host}: {source}")]
    Rewrite {
        host: String,
        #[source]
        source: RewriteError,
    },

    #[error("error querying the service directory for {service}: {source}")]
    Directory {
        service: String,
        #[source]
        source: DirectoryError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("target '{template}' is not a valid URL: {source}")]
    InvalidUrl {
        template: String,
        #[source]
        source: url::ParseError,
    },

    #[error("target '{0}' has no host")]
    MissingHost(String),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}

#[derive(Debug, thiserror::Error)]
#[error("cannot build '{attempted}': {source}")]
pub struct RewriteError {
    pub attempted: String,
    #[source]
    pub source: url::ParseError,
}
