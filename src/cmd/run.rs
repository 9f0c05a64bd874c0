//! `signpost run`: start the redirect server.
//!
//! Builds the immutable [`RouterConfig`] from flags and route sources,
//! picks the directory backend, and serves until SIGTERM / Ctrl+C.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::cli::{DirectoryKind, RunArgs};
use crate::config::{self, non_empty, validation, RouterConfig};
use crate::directory::consul::ConsulCatalog;
use crate::directory::dns::DnsSrv;
use crate::directory::ServiceDirectory;
use crate::engine::RedirectEngine;
use crate::error::SignpostError;
use crate::logging;
use crate::server::{self, AppState};

pub async fn execute(args: RunArgs) -> Result<(), SignpostError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let config = build_config(&args).await?;
    let directory = build_directory(&args)?;

    let route_count = config.routes.len();
    let directory_name = directory.name();

    let state = Arc::new(AppState {
        engine: RedirectEngine::new(Arc::new(config), directory),
    });

    let router = server::build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        routes = route_count,
        directory = directory_name,
        "signpost started"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    tracing::info!("signpost stopped");
    Ok(())
}

pub async fn build_config(args: &RunArgs) -> Result<RouterConfig, SignpostError> {
    let routes = config::load_routes(&args.custom_routes, args.routes_file.as_deref()).await?;

    if !routes.is_empty() {
        tracing::info!(count = routes.len(), "loaded custom routes");
        for entry in routes.entries() {
            tracing::debug!(key = %entry.key, target = %entry.target_template, "custom route");
        }
    }
    // Bad templates only break their own route, so keep serving the rest
    if let Err(errors) = validation::validate(&routes) {
        for error in &errors {
            tracing::warn!(key = %error.key, problem = %error.message, "invalid custom route");
        }
    }

    let config = RouterConfig {
        nomad_ui_hostname: non_empty(args.nomad_ui_hostname.clone()),
        consul_ui_hostname: non_empty(args.consul_ui_hostname.clone()),
        redirect_to_nomad_ui: args.redirect_to_nomad_ui,
        directory_timeout: Duration::from_millis(args.directory_timeout),
        routes,
        ..RouterConfig::default()
    }
    .with_hostname_suffix(args.hostname_suffix.clone());

    Ok(config)
}

fn build_directory(args: &RunArgs) -> Result<Arc<dyn ServiceDirectory>, SignpostError> {
    match args.directory {
        DirectoryKind::Consul => {
            let base = Url::parse(&args.consul_addr).map_err(|e| SignpostError::UriParse {
                source: Box::new(e),
            })?;
            Ok(Arc::new(ConsulCatalog::new(
                server::build_http_client(),
                base,
                non_empty(args.consul_token.clone()),
                non_empty(args.datacenter.clone()),
            )))
        }
        DirectoryKind::Dns => Ok(Arc::new(DnsSrv::from_system_conf(&args.dns_domain)?)),
    }
}
