//! Synapse server client.
//!
//! The server is an opaque HTTP collaborator: every endpoint answers with a
//! JSON `{ok: bool, ...}` envelope, and anything unreachable, non-JSON, or
//! not-ok is treated uniformly as failure. The [`KnowledgeService`] trait is
//! the seam that lets the bootstrap logic run against a fake in tests.

use crate::config::HookConfig;
use crate::models::{ChatEvent, GraphCounts, TrackResult};
use crate::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

/// Operations the hook needs from the knowledge server.
pub trait KnowledgeService: Send + Sync {
    /// Returns true if the server is up and reports ok.
    fn health_check(&self) -> bool;

    /// Triggers a server start for recovery.
    ///
    /// Fire-and-forget: the caller polls [`KnowledgeService::health_check`]
    /// afterwards to find out whether the server actually came up.
    ///
    /// # Errors
    ///
    /// Returns an error if the start could not even be attempted.
    fn start_if_down(&self) -> Result<()>;

    /// Builds the domain knowledge graph for a topic.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports not-ok.
    fn build_domain_graph(&self, topic: &str) -> Result<()>;

    /// Builds the fallback syllabus graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports not-ok.
    fn build_fallback_syllabus(&self) -> Result<()>;

    /// Computes cross-graph embedding alignments.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports not-ok.
    fn align_embedding(&self) -> Result<()>;

    /// Enables aggressive concept detection on the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server reports not-ok.
    fn enable_learning_mode(&self) -> Result<()>;

    /// Queries per-graph node counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn graph_counts(&self) -> Result<GraphCounts>;

    /// Forwards a conversation turn for tracking.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn track_chat(&self, event: &ChatEvent) -> Result<TrackResult>;
}

/// HTTP client for the Synapse server.
pub struct SynapseClient {
    /// Server base URL.
    base_url: String,
    /// Command used to start the server when it is down.
    server_command: Vec<String>,
    /// HTTP client.
    client: reqwest::blocking::Client,
}

/// Minimal `{ok: bool}` response envelope.
#[derive(Debug, Deserialize)]
struct OkEnvelope {
    #[serde(default)]
    ok: bool,
}

impl SynapseClient {
    /// Default server URL.
    pub const DEFAULT_URL: &'static str = "http://localhost:3001";

    /// Creates a client from hook configuration.
    #[must_use]
    pub fn from_config(config: &HookConfig) -> Self {
        Self {
            base_url: config.server_url.trim_end_matches('/').to_string(),
            server_command: config.server_command.clone(),
            client: build_http_client(config.timeout_ms, config.connect_timeout_ms),
        }
    }

    /// Creates a client with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&HookConfig::default())
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Issues a GET and parses the JSON body.
    fn get_json(&self, path: &str, operation: &str) -> Result<serde_json::Value> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .send()
            .map_err(|e| request_error(operation, &e))?;
        parse_json(response, operation)
    }

    /// Issues a POST with a JSON body and parses the JSON response.
    fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
        operation: &str,
    ) -> Result<serde_json::Value> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .map_err(|e| request_error(operation, &e))?;
        parse_json(response, operation)
    }

    /// Posts and requires an `{ok: true}` envelope.
    fn post_expect_ok(
        &self,
        path: &str,
        body: &serde_json::Value,
        operation: &str,
    ) -> Result<()> {
        let value = self.post_json(path, body, operation)?;
        let envelope: OkEnvelope =
            serde_json::from_value(value).map_err(|e| Error::OperationFailed {
                operation: operation.to_string(),
                cause: e.to_string(),
            })?;
        if envelope.ok {
            Ok(())
        } else {
            Err(Error::OperationFailed {
                operation: operation.to_string(),
                cause: "server reported not-ok".to_string(),
            })
        }
    }
}

impl Default for SynapseClient {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeService for SynapseClient {
    fn health_check(&self) -> bool {
        self.get_json("/health", "health_check")
            .ok()
            .and_then(|v| serde_json::from_value::<OkEnvelope>(v).ok())
            .is_some_and(|envelope| envelope.ok)
    }

    fn start_if_down(&self) -> Result<()> {
        let (program, args) = self
            .server_command
            .split_first()
            .ok_or_else(|| Error::InvalidInput("empty server command".to_string()))?;

        tracing::info!(command = %self.server_command.join(" "), "starting synapse server");

        // Detached with stdio discarded so the short-lived hook process can
        // exit while the server keeps running.
        std::process::Command::new(program)
            .args(args)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|e| Error::OperationFailed {
                operation: "start_server".to_string(),
                cause: e.to_string(),
            })
    }

    fn build_domain_graph(&self, topic: &str) -> Result<()> {
        self.post_expect_ok(
            "/graph/domain/build",
            &serde_json::json!({ "topic": topic }),
            "build_domain_graph",
        )
    }

    fn build_fallback_syllabus(&self) -> Result<()> {
        self.post_expect_ok(
            "/ingest/fallback/syllabus/discrete",
            &serde_json::json!({}),
            "build_fallback_syllabus",
        )
    }

    fn align_embedding(&self) -> Result<()> {
        self.post_expect_ok("/align/embedding", &serde_json::json!({}), "align_embedding")
    }

    fn enable_learning_mode(&self) -> Result<()> {
        self.post_expect_ok(
            "/learning-mode/enable",
            &serde_json::json!({}),
            "enable_learning_mode",
        )
    }

    fn graph_counts(&self) -> Result<GraphCounts> {
        let value = self.get_json("/graphs", "graph_counts")?;
        let counts = value
            .get("counts")
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        serde_json::from_value(counts).map_err(|e| Error::OperationFailed {
            operation: "graph_counts".to_string(),
            cause: e.to_string(),
        })
    }

    fn track_chat(&self, event: &ChatEvent) -> Result<TrackResult> {
        let body = serde_json::to_value(event).map_err(|e| Error::OperationFailed {
            operation: "track_chat".to_string(),
            cause: e.to_string(),
        })?;
        let value = self.post_json("/hooks/chat", &body, "track_chat")?;
        serde_json::from_value(value).map_err(|e| Error::OperationFailed {
            operation: "track_chat".to_string(),
            cause: e.to_string(),
        })
    }
}

/// Builds a blocking HTTP client with configured timeouts.
#[must_use]
pub fn build_http_client(timeout_ms: u64, connect_timeout_ms: u64) -> reqwest::blocking::Client {
    let mut builder = reqwest::blocking::Client::builder();
    if timeout_ms > 0 {
        builder = builder.timeout(Duration::from_millis(timeout_ms));
    }
    if connect_timeout_ms > 0 {
        builder = builder.connect_timeout(Duration::from_millis(connect_timeout_ms));
    }

    builder.build().unwrap_or_else(|err| {
        tracing::warn!("Failed to build HTTP client: {err}");
        reqwest::blocking::Client::new()
    })
}

/// Maps a transport error, classifying the failure kind for the log line.
fn request_error(operation: &str, e: &reqwest::Error) -> Error {
    let error_kind = if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connect"
    } else if e.is_request() {
        "request"
    } else {
        "unknown"
    };
    tracing::error!(
        operation = operation,
        error = %e,
        error_kind = error_kind,
        "synapse request failed"
    );
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: format!("{error_kind} error: {e}"),
    }
}

/// Checks the HTTP status and parses the response body as JSON.
fn parse_json(response: reqwest::blocking::Response, operation: &str) -> Result<serde_json::Value> {
    if !response.status().is_success() {
        let status = response.status();
        tracing::error!(
            operation = operation,
            status = %status,
            "synapse API returned error status"
        );
        return Err(Error::OperationFailed {
            operation: operation.to_string(),
            cause: format!("API returned status: {status}"),
        });
    }

    response.json().map_err(|e| {
        tracing::error!(
            operation = operation,
            error = %e,
            "failed to parse synapse response"
        );
        Error::OperationFailed {
            operation: operation.to_string(),
            cause: e.to_string(),
        }
    })
}
