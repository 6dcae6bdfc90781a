//! Shared data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted session state for the active learning topic.
///
/// Stored as a single JSON object in the working directory
/// (`.synapse-session.json` by default). The file is read once at the start
/// of every hook invocation and overwritten wholesale when a bootstrap
/// succeeds; there is no partial merge.
///
/// Invariant: `session_id` and `started_at` are set together, exactly when
/// `initialized` transitions from `false` to `true` for a subject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Whether a tracking session has been bootstrapped.
    #[serde(default)]
    pub initialized: bool,
    /// The active learning subject, if any.
    #[serde(default)]
    pub subject: Option<String>,
    /// Generated session identifier (`session_<timestamp>`).
    #[serde(default)]
    pub session_id: Option<String>,
    /// When the session was bootstrapped.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

impl SessionState {
    /// Returns true if this state already covers the given subject.
    ///
    /// Used for the idempotence check: a repeated bootstrap for the same
    /// subject must not rebuild the remote graphs.
    #[must_use]
    pub fn is_active_for(&self, subject: &str) -> bool {
        self.initialized && self.subject.as_deref() == Some(subject)
    }

    /// Creates a freshly initialized state for a subject.
    #[must_use]
    pub fn initialized_now(subject: &str, session_id: String) -> Self {
        Self {
            initialized: true,
            subject: Some(subject.to_string()),
            session_id: Some(session_id),
            started_at: Some(Utc::now()),
        }
    }
}

/// A conversation turn forwarded to the server's chat ingestion endpoint.
///
/// Field names match the server's JSON contract (`topicHint`, `sessionId`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEvent {
    /// Message role: `user`, `assistant`, or `system`.
    pub role: String,
    /// The message text.
    pub text: String,
    /// Topic the message most likely belongs to.
    pub topic_hint: String,
    /// Name of the working directory, used to group sessions.
    pub workspace: String,
    /// RFC 3339 timestamp of the message.
    pub timestamp: String,
    /// Session identifier, when a session has been bootstrapped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl ChatEvent {
    /// Creates an event for a given role, filling workspace and timestamp.
    #[must_use]
    pub fn new(role: &str, text: &str, topic_hint: &str) -> Self {
        Self {
            role: role.to_string(),
            text: text.to_string(),
            topic_hint: topic_hint.to_string(),
            workspace: workspace_name(),
            timestamp: Utc::now().to_rfc3339(),
            session_id: None,
        }
    }

    /// Creates a user-message event.
    #[must_use]
    pub fn user(text: &str, topic_hint: &str) -> Self {
        Self::new("user", text, topic_hint)
    }

    /// Creates an assistant-message event.
    #[must_use]
    pub fn assistant(text: &str, topic_hint: &str) -> Self {
        Self::new("assistant", text, topic_hint)
    }

    /// Attaches a session identifier.
    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Returns the current working directory's name.
///
/// Used both as the chat-event workspace tag and as the topic fallback when
/// no topic file exists.
#[must_use]
pub fn workspace_name() -> String {
    std::env::current_dir()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "workspace".to_string())
}

/// Result of a chat tracking call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackResult {
    /// Whether the server accepted the message.
    #[serde(default)]
    pub ok: bool,
    /// Number of concepts the server detected in the message.
    #[serde(default)]
    pub detected: u32,
    /// Sample of detected concepts.
    #[serde(default)]
    pub sample: Vec<ConceptHit>,
}

/// A concept detected by the server in a tracked message.
#[derive(Debug, Clone, Deserialize)]
pub struct ConceptHit {
    /// Concept label.
    #[serde(default)]
    pub label: String,
}

/// Node counts per graph, from the server's `/graphs` endpoint.
///
/// `dg` is the domain graph, `sg` the syllabus graph, `pg` the personal
/// (learner progress) graph.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct GraphCounts {
    /// Domain graph node count.
    #[serde(default)]
    pub dg_nodes: u64,
    /// Syllabus graph node count.
    #[serde(default)]
    pub sg_nodes: u64,
    /// Personal graph node count.
    #[serde(default)]
    pub pg_nodes: u64,
}
