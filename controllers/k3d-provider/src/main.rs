//! k3d Provider
//!
//! Resource provider for k3d clusters. Each invocation handles one lifecycle
//! request:
//! - check / preview: validate and default a spec, no side effects
//! - create: `k3d cluster create` from a Simple config, then fetch the kubeconfig
//! - read: refresh recorded state from `k3d cluster list`
//! - diff: classify changes as in-place or replace
//! - update: move nodes to a new k3s image
//! - delete: `k3d cluster delete`, idempotent
//!
//! The request is read from stdin and the response written to stdout; logs go
//! to stderr.

mod config;
mod error;
mod kubeconfig;
mod reconciler;
mod request;
#[cfg(test)]
mod test_utils;

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::reconciler::Reconciler;
use crate::request::{Request, Response};
use anyhow::Context;
use tokio::io::AsyncReadExt;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    info!("Starting k3d provider");

    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("Failed to read request from stdin")?;

    let response = respond(&input, ProviderConfig::from_env()).await;

    let body = serde_json::to_string(&response).context("Failed to encode response")?;
    println!("{}", body);

    if response.is_error() {
        std::process::exit(1);
    }

    Ok(())
}

/// Decode the request and run it
///
/// Configuration and envelope errors become error responses, so they reach
/// stdout like any other failure.
async fn respond(input: &str, config: Result<ProviderConfig, ProviderError>) -> Response {
    match run(input, config).await {
        Ok(response) => response,
        Err(err) => {
            error!("{}", err);
            Response::from_error(&err)
        }
    }
}

async fn run(input: &str, config: Result<ProviderConfig, ProviderError>) -> Result<Response, ProviderError> {
    let config = config?;
    info!("Configuration:");
    info!("  k3d binary: {}", config.k3d_binary);
    info!(
        "  Create timeout: {}",
        config
            .timeout
            .map_or_else(|| "k3d default".to_string(), |t| format!("{}s", t.as_secs()))
    );
    info!("  k3s image repository: {}", config.image_repository);

    let request: Request =
        serde_json::from_str(input).map_err(|e| ProviderError::Request(e.to_string()))?;
    let reconciler = Reconciler::new(config.client(), config.image_repository.clone());
    Ok(request::handle(&reconciler, request).await)
}
