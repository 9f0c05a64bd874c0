//! Redirect decisions.
//!
//! [`RedirectEngine::decide`] takes the `Host` header and the request URL
//! and walks the decision sequence: liveness short-circuits, custom
//! routes (with and without the cluster suffix), the Nomad UI jump, and
//! finally a directory lookup for service addresses. The engine keeps no
//! per-request state, so one instance serves every request concurrently.

use std::sync::Arc;

use url::Url;

use crate::address::{self, ServiceAddress};
use crate::config::RouterConfig;
use crate::directory::{query_with_deadline, CandidateBackend, ServiceDirectory};
use crate::error::RedirectError;
use crate::rewrite::{bare_hostname, rewrite};
use crate::routes::template;

pub const NOMAD_UI_PORT: u16 = 4646;
pub const CONSUL_UI_PORT: u16 = 8500;

#[derive(Debug)]
pub enum RedirectDecision {
    /// `/health*`: answer `200 ok`.
    Health,
    /// `/metrics*`: answer a bare 200.
    Metrics,
    SingleRedirect(Url),
    CandidateList(CandidateListing),
    NoMatch(NoMatch),
    UpstreamError(UpstreamError),
}

#[derive(Debug)]
pub struct CandidateListing {
    pub hostname: String,
    pub address: ServiceAddress,
    pub candidates: Vec<ResolvedCandidate>,
}

/// A directory candidate together with the URL it is linked as.
#[derive(Debug, Clone)]
pub struct ResolvedCandidate {
    pub backend: CandidateBackend,
    /// Node name with the cluster suffix applied.
    pub hostname: String,
    pub url: Url,
}

#[derive(Debug)]
pub struct NoMatch {
    pub hostname: String,
    pub reason: NoMatchReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoMatchReason {
    NotServiceAddress,
    NoInstances(ServiceAddress),
}

#[derive(Debug)]
pub struct UpstreamError {
    pub hostname: String,
    pub error: RedirectError,
}

pub struct RedirectEngine {
    config: Arc<RouterConfig>,
    directory: Arc<dyn ServiceDirectory>,
}

impl RedirectEngine {
    #[must_use]
    pub fn new(config: Arc<RouterConfig>, directory: Arc<dyn ServiceDirectory>) -> Self {
        Self { config, directory }
    }

    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub async fn decide(&self, host_header: &str, request: &Url) -> RedirectDecision {
        let path = request.path().trim_start_matches('/');
        if path.starts_with("health") {
            return RedirectDecision::Health;
        }
        if path.starts_with("metrics") {
            return RedirectDecision::Metrics;
        }

        let hostname = bare_hostname(host_header);

        if let Some(decision) = self.try_custom_routes(hostname, request) {
            return decision;
        }

        if self.config.is_nomad_ui_host(hostname) {
            return self.nomad_ui_redirect(hostname, request);
        }

        let Some(address) = address::parse(hostname, self.config.suffix()) else {
            tracing::debug!(hostname = %hostname, "not a service address");
            return RedirectDecision::NoMatch(NoMatch {
                hostname: hostname.to_string(),
                reason: NoMatchReason::NotServiceAddress,
            });
        };

        let found = query_with_deadline(
            self.directory.as_ref(),
            &address.service_name,
            &address.port_type,
            self.config.directory_timeout,
        )
        .await;

        let mut backends = match found {
            Ok(backends) => backends,
            Err(source) => {
                return upstream(
                    hostname,
                    RedirectError::Directory {
                        service: address.service_name,
                        source,
                    },
                )
            }
        };

        tracing::debug!(
            hostname = %hostname,
            service = %address.service_name,
            port_type = %address.port_type,
            count = backends.len(),
            "directory answered"
        );

        if backends.is_empty() {
            return RedirectDecision::NoMatch(NoMatch {
                hostname: hostname.to_string(),
                reason: NoMatchReason::NoInstances(address),
            });
        }

        sort_backends(&mut backends);

        let mut candidates = Vec::with_capacity(backends.len());
        for backend in backends {
            match self.resolve_candidate(backend, request) {
                Ok(candidate) => candidates.push(candidate),
                Err(error) => return upstream(hostname, error),
            }
        }

        if candidates.len() == 1 {
            if let Some(only) = candidates.pop() {
                return RedirectDecision::SingleRedirect(only.url);
            }
        }

        RedirectDecision::CandidateList(CandidateListing {
            hostname: hostname.to_string(),
            address,
            candidates,
        })
    }

    /// Custom routes for the hostname as given, then without the cluster suffix.
    fn try_custom_routes(&self, hostname: &str, request: &Url) -> Option<RedirectDecision> {
        let routes = &self.config.routes;
        let path = request.path();
        let found = routes.resolve(hostname, path).or_else(|| {
            self.config
                .strip_suffix(hostname)
                .and_then(|short| routes.resolve(short, path))
        })?;

        tracing::debug!(hostname = %hostname, key = %found.key, "custom route matched");

        Some(match template::apply(&found, request) {
            Ok(url) => RedirectDecision::SingleRedirect(url),
            Err(source) => upstream(
                hostname,
                RedirectError::Template {
                    key: found.key.to_string(),
                    source,
                },
            ),
        })
    }

    fn nomad_ui_redirect(&self, hostname: &str, request: &Url) -> RedirectDecision {
        let mut url = match rewrite(request, hostname, "http", Some(NOMAD_UI_PORT)) {
            Ok(url) => url,
            Err(source) => {
                return upstream(
                    hostname,
                    RedirectError::Rewrite {
                        host: hostname.to_string(),
                        source,
                    },
                )
            }
        };

        if url.path().is_empty() || url.path() == "/" {
            url.set_path("/ui/clients");
            url.set_query(None);
            url.query_pairs_mut().append_pair("search", hostname);
        }
        RedirectDecision::SingleRedirect(url)
    }

    fn resolve_candidate(
        &self,
        backend: CandidateBackend,
        request: &Url,
    ) -> Result<ResolvedCandidate, RedirectError> {
        let hostname = self.config.with_suffix(&backend.hostname);
        let url = rewrite(request, &hostname, backend.scheme(), Some(backend.port)).map_err(
            |source| RedirectError::Rewrite {
                host: hostname.clone(),
                source,
            },
        )?;
        Ok(ResolvedCandidate {
            backend,
            hostname,
            url,
        })
    }
}

/// Order by hostname, then port.
pub fn sort_backends(backends: &mut [CandidateBackend]) {
    backends.sort_by(|a, b| {
        a.hostname
            .cmp(&b.hostname)
            .then_with(|| a.port.cmp(&b.port))
    });
}

fn upstream(hostname: &str, error: RedirectError) -> RedirectDecision {
    RedirectDecision::UpstreamError(UpstreamError {
        hostname: hostname.to_string(),
        error,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::directory::DirectoryError;
    use crate::routes::RouteTable;

    #[derive(Default)]
    struct FakeDirectory {
        services: HashMap<String, Vec<CandidateBackend>>,
    }

    impl FakeDirectory {
        fn with(mut self, service: &str, backends: &[(&str, u16, &[&str])]) -> Self {
            self.services.insert(
                service.to_string(),
                backends
                    .iter()
                    .map(|(host, port, tags)| CandidateBackend {
                        hostname: (*host).to_string(),
                        tags: tags.iter().map(|t| (*t).to_string()).collect(),
                        port: *port,
                    })
                    .collect(),
            );
            self
        }
    }

    #[async_trait]
    impl ServiceDirectory for FakeDirectory {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn query(
            &self,
            service: &str,
            _port_type: &str,
        ) -> Result<Vec<CandidateBackend>, DirectoryError> {
            if service == "broken" {
                return Err(DirectoryError::Status(http::StatusCode::BAD_GATEWAY));
            }
            Ok(self.services.get(service).cloned().unwrap_or_default())
        }
    }

    fn engine(config: RouterConfig, directory: FakeDirectory) -> RedirectEngine {
        RedirectEngine::new(Arc::new(config), Arc::new(directory))
    }

    fn request(path_and_query: &str) -> Url {
        Url::parse(&format!("http://localhost{path_and_query}")).unwrap()
    }

    fn redirect_target(decision: RedirectDecision) -> String {
        match decision {
            RedirectDecision::SingleRedirect(url) => url.to_string(),
            other => panic!("expected a redirect, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn liveness_paths_short_circuit() {
        let e = engine(RouterConfig::default(), FakeDirectory::default());
        assert!(matches!(
            e.decide("web.service.consul", &request("/healthz")).await,
            RedirectDecision::Health
        ));
        assert!(matches!(
            e.decide("anything", &request("/health")).await,
            RedirectDecision::Health
        ));
        assert!(matches!(
            e.decide("anything", &request("/metrics")).await,
            RedirectDecision::Metrics
        ));
    }

    #[tokio::test]
    async fn single_candidate_redirects() {
        let e = engine(
            RouterConfig::default(),
            FakeDirectory::default().with("web", &[("node1", 8080, &["https"])]),
        );
        let target = redirect_target(e.decide("web.service.consul:80", &request("/a?b=c")).await);
        assert_eq!(target, "https://node1:8080/a?b=c");
    }

    #[tokio::test]
    async fn candidates_get_the_cluster_suffix() {
        let config = RouterConfig::default().with_hostname_suffix(Some("lab".into()));
        let e = engine(
            config,
            FakeDirectory::default().with("web", &[("node1", 8080, &[])]),
        );
        let target = redirect_target(e.decide("web.service.consul.lab", &request("/")).await);
        assert_eq!(target, "http://node1.lab:8080/");
    }

    #[tokio::test]
    async fn multiple_candidates_are_sorted() {
        let e = engine(
            RouterConfig::default(),
            FakeDirectory::default().with(
                "web",
                &[
                    ("node2", 80, &[]),
                    ("node1", 9000, &[]),
                    ("node1", 8000, &["https"]),
                    ("node2", 80, &[]),
                ],
            ),
        );
        let RedirectDecision::CandidateList(listing) =
            e.decide("web.service.consul", &request("/")).await
        else {
            panic!("expected a listing");
        };
        let order: Vec<(String, u16)> = listing
            .candidates
            .iter()
            .map(|c| (c.hostname.clone(), c.backend.port))
            .collect();
        assert_eq!(
            order,
            vec![
                ("node1".to_string(), 8000),
                ("node1".to_string(), 9000),
                ("node2".to_string(), 80),
                ("node2".to_string(), 80),
            ]
        );
        assert_eq!(listing.candidates[0].url.as_str(), "https://node1:8000/");
    }

    #[tokio::test]
    async fn zero_candidates_is_no_match() {
        let e = engine(RouterConfig::default(), FakeDirectory::default());
        let RedirectDecision::NoMatch(no_match) =
            e.decide("_web._http.service.consul", &request("/")).await
        else {
            panic!("expected no match");
        };
        assert_eq!(
            no_match.reason,
            NoMatchReason::NoInstances(ServiceAddress {
                service_name: "web".into(),
                port_type: "http".into(),
            })
        );
    }

    #[tokio::test]
    async fn unparseable_host_is_no_match() {
        let e = engine(RouterConfig::default(), FakeDirectory::default());
        let RedirectDecision::NoMatch(no_match) = e.decide("junk:8080", &request("/")).await else {
            panic!("expected no match");
        };
        assert_eq!(no_match.hostname, "junk");
        assert_eq!(no_match.reason, NoMatchReason::NotServiceAddress);
    }

    #[tokio::test]
    async fn path_like_service_name_never_reaches_the_directory() {
        let e = engine(RouterConfig::default(), FakeDirectory::default());
        let RedirectDecision::NoMatch(no_match) = e
            .decide(
                "x/%2e%2e/%2e%2e/%2e%2e/v1/kv/secret.service.consul",
                &request("/"),
            )
            .await
        else {
            panic!("expected no match");
        };
        assert_eq!(no_match.reason, NoMatchReason::NotServiceAddress);
    }

    #[tokio::test]
    async fn directory_failure_is_upstream_error() {
        let e = engine(RouterConfig::default(), FakeDirectory::default());
        let decision = e.decide("broken.service.consul", &request("/")).await;
        assert!(matches!(
            decision,
            RedirectDecision::UpstreamError(UpstreamError {
                error: RedirectError::Directory { .. },
                ..
            })
        ));
    }

    #[tokio::test]
    async fn custom_routes_take_precedence_over_directory() {
        let config = RouterConfig {
            routes: RouteTable::from_iter([(
                "web.service.consul".to_string(),
                "http://pinned:1234".to_string(),
            )]),
            ..RouterConfig::default()
        };
        let e = engine(
            config,
            FakeDirectory::default().with("web", &[("node1", 8080, &[])]),
        );
        let target = redirect_target(e.decide("web.service.consul", &request("/x")).await);
        assert_eq!(target, "http://pinned:1234/x");
    }

    #[tokio::test]
    async fn custom_routes_match_without_suffix() {
        let config = RouterConfig {
            routes: RouteTable::from_iter([("h".to_string(), "http://home:1234".to_string())]),
            ..RouterConfig::default()
        }
        .with_hostname_suffix(Some("lab".into()));
        let e = engine(config, FakeDirectory::default());
        let target = redirect_target(e.decide("h.lab", &request("/foo")).await);
        assert_eq!(target, "http://home:1234/foo");
    }

    #[tokio::test]
    async fn broken_template_is_upstream_error() {
        let config = RouterConfig {
            routes: RouteTable::from_iter([("h".to_string(), "::nope".to_string())]),
            ..RouterConfig::default()
        };
        let e = engine(config, FakeDirectory::default());
        assert!(matches!(
            e.decide("h", &request("/")).await,
            RedirectDecision::UpstreamError(UpstreamError {
                error: RedirectError::Template { .. },
                ..
            })
        ));
    }

    #[tokio::test]
    async fn nomad_ui_jump() {
        let mut config = RouterConfig::default().with_hostname_suffix(Some("lab".into()));
        config.redirect_to_nomad_ui = true;
        let e = engine(config, FakeDirectory::default());

        let target = redirect_target(e.decide("node1.lab", &request("/")).await);
        assert_eq!(target, "http://node1.lab:4646/ui/clients?search=node1.lab");

        let target = redirect_target(e.decide("node1.lab", &request("/ui/jobs")).await);
        assert_eq!(target, "http://node1.lab:4646/ui/jobs");
    }

    #[tokio::test]
    async fn decisions_are_repeatable() {
        let e = engine(
            RouterConfig::default(),
            FakeDirectory::default().with("web", &[("b", 2, &[]), ("a", 1, &[])]),
        );
        let first = e.decide("web.service.consul", &request("/p?q=1")).await;
        let second = e.decide("web.service.consul", &request("/p?q=1")).await;
        assert_eq!(format!("{first:?}"), format!("{second:?}"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_directory_times_out() {
        struct Slow;

        #[async_trait]
        impl ServiceDirectory for Slow {
            fn name(&self) -> &'static str {
                "slow"
            }

            async fn query(
                &self,
                _: &str,
                _: &str,
            ) -> Result<Vec<CandidateBackend>, DirectoryError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Vec::new())
            }
        }

        let config = RouterConfig {
            directory_timeout: Duration::from_millis(100),
            ..RouterConfig::default()
        };
        let e = RedirectEngine::new(Arc::new(config), Arc::new(Slow));
        assert!(matches!(
            e.decide("web.service.consul", &request("/")).await,
            RedirectDecision::UpstreamError(UpstreamError {
                error: RedirectError::Directory {
                    source: DirectoryError::Timeout(_),
                    ..
                },
                ..
            })
        ));
    }
}
