//! Outbound HTTP clients used by the tool-calling side.
//!
//! [`HostAgentClient`] talks to the host agent; [`N8nClient`] talks to the n8n
//! REST API. Neither retries: a failed call is returned to the caller as is.

mod host_agent;
mod n8n;

use std::time::Duration;

use host_agent_types::RequestError;
use thiserror::Error;

pub use host_agent::{HostAgentClient, HostAgentTimeouts};
pub use n8n::{N8N_TIMEOUT, N8nClient};

const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
}

impl ClientError {
    fn from_reqwest(err: reqwest::Error, url: &reqwest::Url) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err)
        }
    }
}

fn http_client() -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .build()
        .map_err(ClientError::Build)
}

fn parse_base_url(base_url: &str) -> Result<reqwest::Url, ClientError> {
    let url = reqwest::Url::parse(base_url).map_err(|e| ClientError::InvalidUrl {
        url: base_url.to_string(),
        message: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ClientError::InvalidUrl {
            url: base_url.to_string(),
            message: "not a base URL".to_string(),
        });
    }
    Ok(url)
}

/// `base` with `segments` appended as percent-encoded path segments.
fn join_segments(base: &reqwest::Url, segments: &[&str]) -> reqwest::Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Send `request` and decode a 2xx JSON body; anything else becomes an error.
async fn send_json<T>(request: reqwest::RequestBuilder, url: &reqwest::Url) -> Result<T, ClientError>
where
    T: serde::de::DeserializeOwned,
{
    let response = request
        .send()
        .await
        .map_err(|e| ClientError::from_reqwest(e, url))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(%url, status = status.as_u16(), "Upstream request failed");
        return Err(ClientError::Status { status, body });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ClientError::from_reqwest(e, url))
}
