//! DNS SRV backend.
//!
//! Resolves `{service}.service.{domain}` (or the RFC 2782 form
//! `_{service}._{port_type}.service.{domain}`) and turns each SRV record
//! into a candidate. SRV targets usually name an address record, so the
//! node name is recovered by resolving the target and reverse-resolving
//! its first address. DNS carries no tags.

use std::net::IpAddr;

use async_trait::async_trait;
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::rr::rdata::SRV;
use hickory_resolver::TokioAsyncResolver;

use super::{CandidateBackend, DirectoryError, ServiceDirectory};

pub struct DnsSrv {
    resolver: TokioAsyncResolver,
    domain: String,
}

impl DnsSrv {
    #[must_use]
    pub fn new(resolver: TokioAsyncResolver, domain: &str) -> Self {
        Self {
            resolver,
            domain: domain.trim_matches('.').to_string(),
        }
    }

    /// Build a resolver from `/etc/resolv.conf` (or the platform equivalent).
    pub fn from_system_conf(domain: &str) -> Result<Self, DirectoryError> {
        let resolver = TokioAsyncResolver::tokio_from_system_conf()?;
        Ok(Self::new(resolver, domain))
    }

    #[must_use]
    pub fn srv_name(&self, service: &str, port_type: &str) -> String {
        if port_type.is_empty() {
            format!("{service}.service.{}.", self.domain)
        } else {
            format!("_{service}._{port_type}.service.{}.", self.domain)
        }
    }

    async fn node_name(&self, target: &str) -> Option<String> {
        let ip: IpAddr = self.resolver.lookup_ip(target).await.ok()?.iter().next()?;
        let reverse = match self.resolver.reverse_lookup(ip).await {
            Ok(reverse) => reverse,
            Err(e) => {
                tracing::debug!(ip = %ip, error = %e, "no reverse record");
                return None;
            }
        };
        let name = reverse.iter().next()?.to_string();
        Some(node_label(&name).to_string())
    }
}

/// `web01.node.dc1.consul.` becomes `web01`; other names just lose the root dot.
fn node_label(name: &str) -> &str {
    let name = name.trim_end_matches('.');
    name.split_once(".node.").map_or(name, |(node, _)| node)
}

/// A missing record set is an empty answer, anything else is a failure.
fn no_records_is_empty(error: ResolveError) -> Result<Vec<CandidateBackend>, DirectoryError> {
    if matches!(error.kind(), ResolveErrorKind::NoRecordsFound { .. }) {
        Ok(Vec::new())
    } else {
        Err(error.into())
    }
}

/// The SRV target, or `None` for `.` (RFC 2782: service not available).
fn srv_target(srv: &SRV) -> Option<String> {
    let target = srv.target();
    (!target.is_root()).then(|| target.to_utf8())
}

/// Prefer the reverse-resolved node name, falling back to the SRV target.
fn srv_candidate(
    node: Option<String>,
    target: &str,
    port: u16,
) -> Result<CandidateBackend, DirectoryError> {
    let hostname = node.unwrap_or_else(|| node_label(target).to_string());
    CandidateBackend::checked(hostname, Vec::new(), port)
}

#[async_trait]
impl ServiceDirectory for DnsSrv {
    fn name(&self) -> &'static str {
        "dns"
    }

    async fn query(
        &self,
        service: &str,
        port_type: &str,
    ) -> Result<Vec<CandidateBackend>, DirectoryError> {
        let name = self.srv_name(service, port_type);

        let lookup = match self.resolver.srv_lookup(name.as_str()).await {
            Ok(lookup) => lookup,
            Err(e) => {
                tracing::debug!(name = %name, error = %e, "SRV lookup failed");
                return no_records_is_empty(e);
            }
        };

        let mut candidates = Vec::new();
        for srv in lookup.iter() {
            let Some(target) = srv_target(srv) else {
                tracing::debug!(name = %name, "SRV target is the root, skipping");
                continue;
            };
            let node = self.node_name(&target).await;
            candidates.push(srv_candidate(node, &target, srv.port())?);
        }

        tracing::debug!(name = %name, count = candidates.len(), "SRV lookup answered");
        Ok(candidates)
    }
}
