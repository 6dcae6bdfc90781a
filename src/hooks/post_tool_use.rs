//! Post tool use hook handler.

use super::{HookHandler, passthrough};
use crate::client::KnowledgeService;
use crate::models::{ChatEvent, workspace_name};
use crate::storage::SessionStore;
use crate::Result;
use tracing::instrument;

/// Minimum tool-output length worth tracking. Anything shorter is status
/// noise, not assistant prose.
const MIN_TRACKED_LEN: usize = 20;

/// Handles `PostToolUse` hook events.
///
/// Forwards substantial tool output to the server as assistant text and
/// always passes the original payload through.
pub struct PostToolUseHandler<S: KnowledgeService> {
    /// Knowledge server client.
    client: S,
    /// Session state persistence.
    store: SessionStore,
}

impl<S: KnowledgeService> PostToolUseHandler<S> {
    /// Creates a new handler.
    #[must_use]
    pub const fn new(client: S, store: SessionStore) -> Self {
        Self { client, store }
    }

    /// Returns the underlying client.
    pub const fn client(&self) -> &S {
        &self.client
    }

    /// Extracts assistant-visible text from a `tool_output` value.
    fn output_text(tool_output: &serde_json::Value) -> Option<String> {
        match tool_output {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(map) => {
                let from_field = map
                    .get("content")
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.is_empty())
                    .or_else(|| {
                        map.get("text")
                            .and_then(|v| v.as_str())
                            .filter(|s| !s.is_empty())
                    });
                Some(from_field.map_or_else(|| tool_output.to_string(), ToString::to_string))
            },
            _ => None,
        }
    }
}

impl<S: KnowledgeService> HookHandler for PostToolUseHandler<S> {
    fn event_type(&self) -> &'static str {
        "PostToolUse"
    }

    #[instrument(skip(self, input), fields(hook = "PostToolUse"))]
    fn handle(&self, input: &str) -> Result<String> {
        let Ok(payload) = serde_json::from_str::<serde_json::Value>(input) else {
            return Ok(passthrough(input));
        };

        let text = payload
            .get("tool_output")
            .and_then(Self::output_text)
            .unwrap_or_default();

        if text.trim().len() > MIN_TRACKED_LEN {
            let topic = self.store.current_topic().unwrap_or_else(workspace_name);
            let state = self.store.load();
            let mut event = ChatEvent::assistant(text.trim(), &topic);
            if let Some(id) = state.session_id.as_deref() {
                event = event.with_session(id);
            }
            if let Err(e) = self.client.track_chat(&event) {
                tracing::debug!(error = %e, "tool output tracking failed");
            }
        }

        Ok(passthrough(input))
    }
}
