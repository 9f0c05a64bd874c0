//! `signpost health`: check the health of a running instance.
//!
//! Sends a `GET /health` request to the specified URL and reports whether
//! the instance answered `200 ok`.

use http_body_util::BodyExt;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::cli::HealthArgs;
use crate::error::SignpostError;

pub async fn execute(args: HealthArgs) -> Result<(), SignpostError> {
    let url = format!("{}/health", args.url.trim_end_matches('/'));
    let uri: hyper::Uri =
        url.parse().map_err(
            |e: hyper::http::uri::InvalidUri| SignpostError::UriParse {
                source: Box::new(e),
            },
        )?;

    let connector = hyper_util::client::legacy::connect::HttpConnector::new();
    let client = Client::builder(TokioExecutor::new()).build(connector);

    let req = hyper::Request::builder()
        .uri(uri)
        .body(http_body_util::Full::new(bytes::Bytes::new()))
        .map_err(|e| SignpostError::HttpRequest {
            source: Box::new(e),
        })?;

    let response = tokio::time::timeout(std::time::Duration::from_secs(10), client.request(req))
        .await
        .map_err(|_| SignpostError::HttpRequest {
            source: "health check timed out after 10s".into(),
        })?
        .map_err(|e| SignpostError::HttpRequest {
            source: Box::new(e),
        })?;

    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| SignpostError::HttpRequest {
            source: Box::new(e),
        })?
        .to_bytes();

    if !status.is_success() {
        return Err(SignpostError::HealthCheckFailed(status));
    }

    println!(
        "\u{2713} signpost is healthy ({}): {}",
        args.url,
        String::from_utf8_lossy(&body).trim()
    );
    Ok(())
}
