use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use vreplag_types::{Stream, StreamKey, TabletDebugVars, Workflow};

/// Configuration for the vtadmin client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// vtadmin-api address (e.g., "http://127.0.0.1:14200")
    pub base_url: String,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Maximum retry attempts on transport failure
    pub max_retries: usize,

    /// Delay before the first retry; doubled on each further attempt
    pub retry_backoff: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:14200".to_string(),
            request_timeout: Duration::from_secs(5),
            max_retries: 3,
            retry_backoff: Duration::from_millis(100),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Create config for testing (shorter timeouts)
    pub fn test_config() -> Self {
        Self {
            request_timeout: Duration::from_millis(500),
            max_retries: 1,
            retry_backoff: Duration::from_millis(10),
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            ));
        }

        if self.request_timeout.as_millis() == 0 {
            return Err("request_timeout must be > 0".to_string());
        }

        Ok(())
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// Network error, timeout, or CORS-style refusal before any response.
    #[error("Fetch failed for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The body was JSON but not a `{ "ok": bool, ... }` envelope.
    #[error("Malformed response envelope from {endpoint}")]
    MalformedEnvelope { endpoint: String },

    /// The envelope reported `ok: false`.
    #[error("[status {status}] {endpoint}: {code} {message}")]
    NotOk {
        endpoint: String,
        status: u16,
        code: String,
        message: String,
    },

    #[error("Failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Workflow(#[from] vreplag_types::Error),

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Short label used for error metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "fetch",
            Self::MalformedEnvelope { .. } => "malformed_envelope",
            Self::NotOk { .. } => "not_ok",
            Self::Decode { .. } => "decode",
            Self::Workflow(vreplag_types::Error::StreamNotFound(_)) => "stream_not_found",
            Self::Workflow(vreplag_types::Error::InvalidStreamKey(_)) => "invalid_stream_key",
            Self::Config(_) => "config",
        }
    }

    /// Only transport failures are worth retrying immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}

/// Validates the vtadmin response envelope and returns its `result`.
///
/// The envelope is not part of the API's protobuf definitions, so its shape
/// is checked by hand: a missing (or non-boolean) `ok` is malformed, and
/// `ok: false` is surfaced with the envelope's error code and message.
pub fn parse_envelope(endpoint: &str, status: u16, body: &[u8]) -> Result<Value, ClientError> {
    let mut json: Value = serde_json::from_slice(body).map_err(|source| ClientError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })?;

    let ok = json
        .get("ok")
        .and_then(Value::as_bool)
        .ok_or_else(|| ClientError::MalformedEnvelope {
            endpoint: endpoint.to_string(),
        })?;

    if !ok {
        let error = json.get("error");
        let field = |name: &str| {
            error
                .and_then(|e| e.get(name))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        return Err(ClientError::NotOk {
            endpoint: endpoint.to_string(),
            status,
            code: field("code"),
            message: field("message"),
        });
    }

    Ok(json.get_mut("result").map(Value::take).unwrap_or(Value::Null))
}

/// HTTP client for vtadmin-api.
#[derive(Clone)]
pub struct VtAdminClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl VtAdminClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate().map_err(ClientError::Config)?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| ClientError::Fetch {
                url: config.base_url.clone(),
                source,
            })?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    async fn fetch_once(&self, endpoint: &str) -> Result<Value, ClientError> {
        let url = self.url(endpoint);
        let fetch_err = |source| ClientError::Fetch {
            url: url.clone(),
            source,
        };

        let response = self.http.get(&url).send().await.map_err(fetch_err)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(fetch_err)?;

        parse_envelope(endpoint, status, &body)
    }

    /// GETs `endpoint`, unwraps the envelope and decodes `result` as `T`.
    /// Transport failures are retried with exponential backoff.
    pub async fn fetch<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ClientError> {
        let mut attempt = 0usize;
        let result = loop {
            match self.fetch_once(endpoint).await {
                Ok(result) => break result,
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.retry_backoff * 2u32.saturating_pow(attempt as u32);
                    tracing::debug!(
                        "GET {} failed (attempt {}), retrying in {:?}: {}",
                        endpoint,
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        serde_json::from_value(result).map_err(|source| ClientError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    /// `GET /api/workflow/{cluster}/{keyspace}/{name}`
    pub async fn fetch_workflow(
        &self,
        cluster_id: &str,
        keyspace: &str,
        name: &str,
    ) -> Result<Workflow, ClientError> {
        self.fetch(&format!("/api/workflow/{}/{}/{}", cluster_id, keyspace, name))
            .await
    }

    /// Fetches the workflow and picks out a single stream.
    pub async fn fetch_stream(
        &self,
        cluster_id: &str,
        keyspace: &str,
        name: &str,
        key: &StreamKey,
    ) -> Result<Stream, ClientError> {
        let workflow = self.fetch_workflow(cluster_id, keyspace, name).await?;
        workflow
            .find_stream(key)
            .cloned()
            .ok_or_else(|| vreplag_types::Error::StreamNotFound(key.to_string()).into())
    }

    /// `GET /api/experimental/tablet/{alias}/debug/vars?cluster={cluster}`
    pub async fn fetch_tablet_debug_vars(
        &self,
        cluster_id: &str,
        alias: &str,
    ) -> Result<TabletDebugVars, ClientError> {
        self.fetch(&format!(
            "/api/experimental/tablet/{}/debug/vars?cluster={}",
            alias, cluster_id
        ))
        .await
    }
}
