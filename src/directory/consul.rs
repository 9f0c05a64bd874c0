//! Consul catalog backend.
//!
//! Issues `GET /v1/catalog/service/{name}` against the agent, using the
//! port type as the tag filter, and maps each entry to a
//! [`CandidateBackend`] keyed by node name.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use serde::Deserialize;
use url::Url;

use super::{CandidateBackend, DirectoryError, ServiceDirectory};
use crate::server::HttpClient;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CatalogService {
    node: String,
    #[serde(default)]
    service_tags: Option<Vec<String>>,
    #[serde(default)]
    service_port: u16,
}

pub struct ConsulCatalog {
    client: HttpClient,
    base: Url,
    token: Option<String>,
    datacenter: Option<String>,
}

impl ConsulCatalog {
    #[must_use]
    pub fn new(
        client: HttpClient,
        base: Url,
        token: Option<String>,
        datacenter: Option<String>,
    ) -> Self {
        Self {
            client,
            base,
            token,
            datacenter,
        }
    }

    /// The service name is pushed as a single encoded path segment.
    pub fn catalog_url(&self, service: &str, port_type: &str) -> Result<Url, DirectoryError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| DirectoryError::Http {
                source: format!("consul address {} cannot carry a path", self.base).into(),
            })?
            .pop_if_empty()
            .extend(["v1", "catalog", "service"])
            .push(service);
        url.set_query(None);

        let mut pairs = Vec::new();
        if !port_type.is_empty() {
            pairs.push(("tag", port_type));
        }
        if let Some(ref dc) = self.datacenter {
            pairs.push(("dc", dc.as_str()));
        }
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }
}

#[async_trait]
impl ServiceDirectory for ConsulCatalog {
    fn name(&self) -> &'static str {
        "consul"
    }

    async fn query(
        &self,
        service: &str,
        port_type: &str,
    ) -> Result<Vec<CandidateBackend>, DirectoryError> {
        let url = self.catalog_url(service, port_type)?;

        let mut builder = hyper::Request::builder().uri(url.as_str());
        if let Some(ref token) = self.token {
            builder = builder.header("x-consul-token", token);
        }
        let req = builder
            .body(Full::new(Bytes::new()))
            .map_err(|e| DirectoryError::Http {
                source: Box::new(e),
            })?;

        let response = self
            .client
            .request(req)
            .await
            .map_err(|e| DirectoryError::Http {
                source: Box::new(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Status(status));
        }

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| DirectoryError::Http {
                source: Box::new(e),
            })?
            .to_bytes();

        let entries: Vec<CatalogService> = serde_json::from_slice(&body)?;

        tracing::debug!(
            service = %service,
            port_type = %port_type,
            count = entries.len(),
            "consul catalog answered"
        );

        entries
            .into_iter()
            .map(|entry| {
                tracing::trace!(node = %entry.node, port = entry.service_port, "catalog entry");
                CandidateBackend::checked(
                    entry.node,
                    entry.service_tags.unwrap_or_default(),
                    entry.service_port,
                )
            })
            .collect()
    }
}
