//! Service directory lookups.
//!
//! The redirect engine only sees the [`ServiceDirectory`] trait. Two
//! backends implement it: [`consul::ConsulCatalog`] (catalog HTTP API) and
//! [`dns::DnsSrv`] (SRV records plus reverse DNS for node names).

pub mod consul;
pub mod dns;

use std::time::Duration;

use async_trait::async_trait;

/// One registered instance of a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateBackend {
    pub hostname: String,
    pub tags: Vec<String>,
    pub port: u16,
}

impl CandidateBackend {
    /// `https` or `http` from the first tag naming either, case-insensitively.
    #[must_use]
    pub fn scheme(&self) -> &'static str {
        self.tags
            .iter()
            .find_map(|tag| {
                if tag.eq_ignore_ascii_case("https") {
                    Some("https")
                } else if tag.eq_ignore_ascii_case("http") {
                    Some("http")
                } else {
                    None
                }
            })
            .unwrap_or("http")
    }

    /// Port 0 means the directory gave us nothing usable.
    pub(crate) fn checked(
        hostname: String,
        tags: Vec<String>,
        port: u16,
    ) -> Result<Self, DirectoryError> {
        if port == 0 {
            return Err(DirectoryError::InvalidPort { node: hostname });
        }
        Ok(Self {
            hostname,
            tags,
            port,
        })
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DirectoryError {
    #[error("directory query timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("directory request failed: {source}")]
    Http {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("directory returned status {0}")]
    Status(http::StatusCode),

    #[error("malformed directory response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("directory entry for node '{node}' has no usable port")]
    InvalidPort { node: String },

    #[error("DNS lookup failed: {0}")]
    Dns(#[from] hickory_resolver::error::ResolveError),
}

// async_trait keeps the trait object-safe; the engine holds Arc<dyn ServiceDirectory>.
#[async_trait]
pub trait ServiceDirectory: Send + Sync {
    fn name(&self) -> &'static str;

    /// Look up instances of `service`, filtered by `port_type` when it is
    /// non-empty. An empty `Ok` means the service has no instances.
    async fn query(
        &self,
        service: &str,
        port_type: &str,
    ) -> Result<Vec<CandidateBackend>, DirectoryError>;
}

/// Run `query` with a deadline.
pub async fn query_with_deadline(
    directory: &dyn ServiceDirectory,
    service: &str,
    port_type: &str,
    deadline: Duration,
) -> Result<Vec<CandidateBackend>, DirectoryError> {
    tokio::time::timeout(deadline, directory.query(service, port_type))
        .await
        .map_err(|_| DirectoryError::Timeout(deadline))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(tags: &[&str]) -> CandidateBackend {
        CandidateBackend {
            hostname: "node1".into(),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            port: 8080,
        }
    }

    #[test]
    fn scheme_defaults_to_http() {
        assert_eq!(candidate(&[]).scheme(), "http");
        assert_eq!(candidate(&["metrics", "v2"]).scheme(), "http");
    }

    #[test]
    fn scheme_from_first_matching_tag() {
        assert_eq!(candidate(&["HTTPS"]).scheme(), "https");
        assert_eq!(candidate(&["web", "https", "http"]).scheme(), "https");
        assert_eq!(candidate(&["Http", "https"]).scheme(), "http");
    }

    #[test]
    fn zero_port_is_rejected() {
        let err = CandidateBackend::checked("node1".into(), vec![], 0).unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidPort { .. }));
        assert!(CandidateBackend::checked("node1".into(), vec![], 1).is_ok());
    }

    struct Stalled;

    #[async_trait]
    impl ServiceDirectory for Stalled {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn query(&self, _: &str, _: &str) -> Result<Vec<CandidateBackend>, DirectoryError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_turns_a_stall_into_an_error() {
        let err = query_with_deadline(&Stalled, "web", "", Duration::from_millis(250))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Timeout(d) if d == Duration::from_millis(250)));
    }
}
