//! Shared reqwest plumbing for provider adapters.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult, ProviderError};

/// Build a pooled HTTP client with a per-request timeout.
pub fn build_client(timeout_secs: u64) -> DomainResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DomainError::Configuration(format!("failed to build HTTP client: {e}")))
}

/// Map a reqwest failure (no HTTP status involved) to a provider error.
pub fn transport_error(service: &'static str, err: &reqwest::Error) -> DomainError {
    if err.is_timeout() {
        ProviderError::Timeout { service }.into()
    } else {
        ProviderError::Transport {
            service,
            message: err.to_string(),
        }
        .into()
    }
}

/// Turn a non-success response into a classified provider error.
async fn error_from_response(service: &'static str, response: Response) -> DomainError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unable to read response body".to_string());
    debug!(service, status, body = %body, "provider returned an error status");
    ProviderError::from_status(service, status, body).into()
}

/// Fail on non-success statuses, discarding the body otherwise.
pub async fn expect_success(service: &'static str, response: Response) -> DomainResult<()> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(error_from_response(service, response).await)
    }
}

/// Fail on non-success statuses, otherwise decode the JSON body.
pub async fn read_json<T: DeserializeOwned>(service: &'static str, response: Response) -> DomainResult<T> {
    if !response.status().is_success() {
        return Err(error_from_response(service, response).await);
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| transport_error(service, &e))?;

    serde_json::from_slice(&bytes).map_err(|e| {
        ProviderError::Malformed {
            service,
            message: e.to_string(),
        }
        .into()
    })
}

/// Resolve an API key from configuration, falling back to an environment variable.
pub fn resolve_api_key(configured: Option<&String>, env_var: &str, service: &str) -> DomainResult<String> {
    configured
        .filter(|key| !key.trim().is_empty())
        .cloned()
        .or_else(|| std::env::var(env_var).ok().filter(|key| !key.trim().is_empty()))
        .ok_or_else(|| {
            DomainError::Configuration(format!(
                "{service} API key not set. Set {env_var} env var or configure api_key."
            ))
        })
}
