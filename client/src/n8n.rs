use std::time::Duration;

use reqwest::Method;
use serde_json::Value;

use crate::{ClientError, http_client, join_segments, parse_base_url, send_json};

pub const N8N_TIMEOUT: Duration = Duration::from_secs(30);

const API_KEY_HEADER: &str = "X-N8N-API-KEY";

/// Client for the n8n public REST API (`/api/v1`). Workflow bodies are passed
/// through as opaque JSON.
#[derive(Clone)]
pub struct N8nClient {
    http: reqwest::Client,
    base_url: reqwest::Url,
    api_key: String,
    timeout: Duration,
}

impl std::fmt::Debug for N8nClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("N8nClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl N8nClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, ClientError> {
        Ok(Self {
            http: http_client()?,
            base_url: parse_base_url(base_url)?,
            api_key: api_key.into(),
            timeout: N8N_TIMEOUT,
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// All workflows. n8n wraps the list as `{"data": [...]}`; a bare array is
    /// accepted too.
    pub async fn list_workflows(&self) -> Result<Vec<Value>, ClientError> {
        match self.call(Method::GET, &["workflows"], None).await? {
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(items)) => Ok(items),
                _ => Err(ClientError::Decode(
                    "workflow list has no data array".to_string(),
                )),
            },
            Value::Array(items) => Ok(items),
            other => Err(ClientError::Decode(format!(
                "unexpected workflow list: {other}"
            ))),
        }
    }

    pub async fn get_workflow(&self, id: &str) -> Result<Value, ClientError> {
        self.call(Method::GET, &["workflows", id], None).await
    }

    pub async fn create_workflow(&self, workflow: &Value) -> Result<Value, ClientError> {
        self.call(Method::POST, &["workflows"], Some(workflow)).await
    }

    pub async fn update_workflow(&self, id: &str, workflow: &Value) -> Result<Value, ClientError> {
        self.call(Method::PUT, &["workflows", id], Some(workflow))
            .await
    }

    pub async fn delete_workflow(&self, id: &str) -> Result<Value, ClientError> {
        self.call(Method::DELETE, &["workflows", id], None).await
    }

    pub async fn activate_workflow(&self, id: &str) -> Result<Value, ClientError> {
        self.call(Method::POST, &["workflows", id, "activate"], None)
            .await
    }

    pub async fn deactivate_workflow(&self, id: &str) -> Result<Value, ClientError> {
        self.call(Method::POST, &["workflows", id, "deactivate"], None)
            .await
    }

    async fn call(
        &self,
        method: Method,
        path: &[&str],
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let mut segments = vec!["api", "v1"];
        segments.extend_from_slice(path);
        let url = join_segments(&self.base_url, &segments);

        let mut builder = self
            .http
            .request(method, url.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(self.timeout);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        send_json(builder, &url).await
    }
}
