use std::time::Duration;

use host_agent_types::{
    BackupReport, GetFilesRequest, GetFilesResult, HealthStatus, MAX_FILES_PER_REQUEST,
    RequestError, SearchRequest, SearchResult,
};

use crate::{ClientError, http_client, join_segments, parse_base_url, send_json};

/// Per-operation deadlines for [`HostAgentClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostAgentTimeouts {
    pub search: Duration,
    pub get_files: Duration,
    pub backup: Duration,
    pub health: Duration,
}

impl Default for HostAgentTimeouts {
    fn default() -> Self {
        Self {
            search: Duration::from_secs(60),
            get_files: Duration::from_secs(120),
            backup: Duration::from_secs(300),
            health: Duration::from_secs(10),
        }
    }
}

/// Client for the host agent's HTTP surface.
#[derive(Clone)]
pub struct HostAgentClient {
    http: reqwest::Client,
    base_url: reqwest::Url,
    token: String,
    timeouts: HostAgentTimeouts,
}

impl std::fmt::Debug for HostAgentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostAgentClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"[REDACTED]")
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

impl HostAgentClient {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, ClientError> {
        Ok(Self {
            http: http_client()?,
            base_url: parse_base_url(base_url)?,
            token: token.into(),
            timeouts: HostAgentTimeouts::default(),
        })
    }

    #[must_use]
    pub fn with_timeouts(mut self, timeouts: HostAgentTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResult, ClientError> {
        let url = join_segments(&self.base_url, &["search"]);
        let builder = self
            .http
            .post(url.clone())
            .bearer_auth(&self.token)
            .timeout(self.timeouts.search)
            .json(request);
        send_json(builder, &url).await
    }

    /// Fails locally, without any network IO, when more than
    /// [`MAX_FILES_PER_REQUEST`] paths are requested.
    pub async fn get_files(&self, request: &GetFilesRequest) -> Result<GetFilesResult, ClientError> {
        if request.files.len() > MAX_FILES_PER_REQUEST {
            return Err(RequestError::TooManyFiles {
                requested: request.files.len(),
                max: MAX_FILES_PER_REQUEST,
            }
            .into());
        }
        let url = join_segments(&self.base_url, &["get_files"]);
        let builder = self
            .http
            .post(url.clone())
            .bearer_auth(&self.token)
            .timeout(self.timeouts.get_files)
            .json(request);
        send_json(builder, &url).await
    }

    pub async fn backup_n8n(&self) -> Result<BackupReport, ClientError> {
        let url = join_segments(&self.base_url, &["backup", "n8n"]);
        let builder = self
            .http
            .post(url.clone())
            .bearer_auth(&self.token)
            .timeout(self.timeouts.backup);
        send_json(builder, &url).await
    }

    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let url = join_segments(&self.base_url, &["health"]);
        let builder = self.http.get(url.clone()).timeout(self.timeouts.health);
        send_json(builder, &url).await
    }
}
