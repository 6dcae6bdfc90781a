//! User prompt submit hook handler.

use super::{HookHandler, passthrough, subject::extract_subject};
use crate::client::KnowledgeService;
use crate::models::{ChatEvent, workspace_name};
use crate::services::BootstrapService;
use crate::storage::SessionStore;
use crate::Result;
use std::time::Duration;
use tracing::instrument;

/// Handles `UserPromptSubmit` hook events.
///
/// Extracts a learning subject from the prompt, bootstraps a tracking
/// session when one is found, and forwards the prompt to the server's chat
/// ingestion endpoint. The prompt (optionally annotated) is always passed
/// through.
pub struct UserPromptHandler<S: KnowledgeService> {
    /// Knowledge server client.
    client: S,
    /// Session state persistence.
    store: SessionStore,
    /// Server URL shown in the tracking annotation.
    server_url: String,
    /// Health poll attempts for the bootstrap.
    poll_attempts: u32,
    /// Health poll interval for the bootstrap.
    poll_interval: Duration,
}

impl<S: KnowledgeService> UserPromptHandler<S> {
    /// Creates a new handler.
    #[must_use]
    pub fn new(client: S, store: SessionStore) -> Self {
        Self {
            client,
            store,
            server_url: crate::client::SynapseClient::DEFAULT_URL.to_string(),
            poll_attempts: 10,
            poll_interval: Duration::from_secs(1),
        }
    }

    /// Sets the server URL used in the annotation text.
    #[must_use]
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// Sets the health polling budget for the bootstrap.
    #[must_use]
    pub const fn with_health_poll(mut self, attempts: u32, interval: Duration) -> Self {
        self.poll_attempts = attempts;
        self.poll_interval = interval;
        self
    }

    /// Returns the underlying client.
    pub const fn client(&self) -> &S {
        &self.client
    }

    /// The topic to tag general conversation with.
    fn current_topic(&self) -> String {
        self.store.current_topic().unwrap_or_else(workspace_name)
    }

    /// Sends a best-effort tracking call, logging detected concepts.
    fn track(&self, event: &ChatEvent) {
        match self.client.track_chat(event) {
            Ok(result) if result.detected > 0 => {
                let labels: Vec<&str> = result
                    .sample
                    .iter()
                    .take(3)
                    .map(|c| c.label.as_str())
                    .collect();
                tracing::info!(
                    detected = result.detected,
                    concepts = labels.join(", "),
                    "tracked concepts"
                );
            },
            Ok(_) => {},
            Err(e) => {
                tracing::debug!(error = %e, "tracking call failed");
            },
        }
    }
}

impl<S: KnowledgeService> HookHandler for UserPromptHandler<S> {
    fn event_type(&self) -> &'static str {
        "UserPromptSubmit"
    }

    #[instrument(skip(self, input), fields(hook = "UserPromptSubmit"))]
    fn handle(&self, input: &str) -> Result<String> {
        // JSON payload, or the raw text itself as the prompt.
        let prompt = match serde_json::from_str::<serde_json::Value>(input) {
            Ok(payload) => match payload.get("prompt").and_then(|p| p.as_str()) {
                Some(p) => p.trim().to_string(),
                // Valid JSON without a prompt field belongs to some other
                // event kind; echo it untouched.
                None => return Ok(passthrough(input)),
            },
            Err(_) => input.trim().to_string(),
        };

        if prompt.is_empty() {
            return Ok(passthrough(input));
        }

        let Some(subject) = extract_subject(&prompt) else {
            // General conversation: track under the current topic.
            let topic = self.current_topic();
            let state = self.store.load();
            let mut event = ChatEvent::user(&prompt, &topic);
            if let Some(id) = state.session_id.as_deref() {
                event = event.with_session(id);
            }
            self.track(&event);
            return Ok(prompt);
        };

        tracing::info!(subject = %subject, "learning subject detected");
        self.store.remember_topic(&subject);

        let prior = self.store.load();
        let outcome = BootstrapService::new(&self.client, &self.store)
            .with_health_poll(self.poll_attempts, self.poll_interval)
            .run(&prompt, &subject, prior);

        // A fresh bootstrap already reported this prompt (step 7); only the
        // idempotent and failure paths still need a tracking call.
        if !outcome.freshly_initialized {
            let mut event = ChatEvent::user(&prompt, &subject);
            if let Some(id) = outcome.state.session_id.as_deref() {
                event = event.with_session(id);
            }
            self.track(&event);
        }

        Ok(format!(
            "{prompt}\n\n[Your learning progress is being automatically tracked at {}]",
            self.server_url
        ))
    }
}
