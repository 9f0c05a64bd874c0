//! The catch-all HTTP handler.
//!
//! [`redirect_handler`] is the Axum fallback for every request. It hands
//! the `Host` header and request URL to the
//! [`RedirectEngine`](crate::engine::RedirectEngine) and turns the
//! decision into a response: 307 redirects, 200 listings, 404 help pages
//! and 500 error pages.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use url::Url;

use crate::config::RouterConfig;
use crate::engine::RedirectDecision;
use crate::error::{RedirectError, RewriteError};
use crate::pages;
use crate::server::AppState;

const CORRELATION_HEADER: &str = "x-correlation-id";

pub async fn redirect_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    req_headers: HeaderMap,
) -> Response {
    let correlation_id = req_headers
        .get(CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);

    let host = req_headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.host())
        .unwrap_or_default();

    // Only the path and query of this URL are ever used; the authority is
    // replaced on every rewrite.
    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
    let attempted = format!("http://localhost{path_and_query}");
    let decision = match Url::parse(&attempted) {
        Ok(request) => state.engine.decide(host, &request).await,
        Err(source) => {
            let error = RedirectError::Rewrite {
                host: host.to_string(),
                source: RewriteError { attempted, source },
            };
            tracing::error!(
                correlation_id = %correlation_id,
                host = %host,
                error = %error,
                "cannot re-parse request URL"
            );
            let mut response =
                (StatusCode::INTERNAL_SERVER_ERROR, Html(pages::server_error(&error.to_string())))
                    .into_response();
            tag(&mut response, &correlation_id);
            return response;
        }
    };

    let mut response = respond(
        decision,
        state.engine.config(),
        &correlation_id,
        &method,
        uri.path(),
    );
    tag(&mut response, &correlation_id);
    response
}

fn respond(
    decision: RedirectDecision,
    config: &RouterConfig,
    correlation_id: &str,
    method: &Method,
    path: &str,
) -> Response {
    match decision {
        RedirectDecision::Health => {
            tracing::debug!(correlation_id = %correlation_id, path = %path, "health check");
            (StatusCode::OK, "ok").into_response()
        }
        RedirectDecision::Metrics => StatusCode::OK.into_response(),
        RedirectDecision::SingleRedirect(url) => {
            tracing::info!(
                correlation_id = %correlation_id,
                method = %method,
                path = %path,
                location = %url,
                "redirecting"
            );
            Redirect::temporary(url.as_str()).into_response()
        }
        RedirectDecision::CandidateList(listing) => {
            tracing::info!(
                correlation_id = %correlation_id,
                hostname = %listing.hostname,
                service = %listing.address.service_name,
                candidates = listing.candidates.len(),
                "listing candidates"
            );
            Html(pages::listing(&listing, config)).into_response()
        }
        RedirectDecision::NoMatch(no_match) => {
            tracing::warn!(
                correlation_id = %correlation_id,
                hostname = %no_match.hostname,
                reason = ?no_match.reason,
                "no redirect target"
            );
            (StatusCode::NOT_FOUND, Html(pages::not_found(&no_match, config))).into_response()
        }
        RedirectDecision::UpstreamError(failure) => {
            tracing::error!(
                correlation_id = %correlation_id,
                hostname = %failure.hostname,
                error = %failure.error,
                "redirect failed"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(pages::server_error(&failure.error.to_string())),
            )
                .into_response()
        }
    }
}

fn tag(response: &mut Response, correlation_id: &str) {
    if let Ok(value) = HeaderValue::from_str(correlation_id) {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
}
