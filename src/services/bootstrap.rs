//! Session bootstrap service.
//!
//! Runs the one-time-per-subject sequence of remote calls that prepares
//! tracking infrastructure for a subject: health check (with a bounded
//! start-and-poll recovery), the load-bearing domain graph build, and a set
//! of best-effort follow-ups. State changes are all-or-nothing: the
//! persisted session state is only rewritten when the whole bootstrap
//! succeeds.

use crate::client::KnowledgeService;
use crate::models::{ChatEvent, SessionState};
use crate::storage::SessionStore;
use chrono::Utc;
use std::time::Duration;
use tracing::instrument;

/// Result of a bootstrap attempt.
#[derive(Debug, Clone)]
pub struct BootstrapOutcome {
    /// Whether a session now covers the subject.
    pub success: bool,
    /// State after the attempt (unchanged on failure).
    pub state: SessionState,
    /// Whether this attempt freshly initialized the session (false on the
    /// idempotent short-circuit and on failure).
    pub freshly_initialized: bool,
}

/// Bootstraps remote tracking sessions.
///
/// Borrows the client and store from the calling handler; one instance
/// lives for at most one hook invocation.
pub struct BootstrapService<'a, S: KnowledgeService> {
    /// Knowledge server client.
    client: &'a S,
    /// Session state persistence.
    store: &'a SessionStore,
    /// Health poll attempts after triggering a server start.
    poll_attempts: u32,
    /// Interval between health polls.
    poll_interval: Duration,
}

impl<'a, S: KnowledgeService> BootstrapService<'a, S> {
    /// Creates a bootstrap service with default polling (10 x 1 s).
    #[must_use]
    pub fn new(client: &'a S, store: &'a SessionStore) -> Self {
        Self {
            client,
            store,
            poll_attempts: 10,
            poll_interval: Duration::from_secs(1),
        }
    }

    /// Sets the health polling budget.
    #[must_use]
    pub const fn with_health_poll(mut self, attempts: u32, interval: Duration) -> Self {
        self.poll_attempts = attempts;
        self.poll_interval = interval;
        self
    }

    /// Runs the bootstrap sequence for a subject.
    ///
    /// Never returns an error: every failure mode degrades to
    /// `success: false` with the prior state untouched, so the hook can
    /// always fall back to plain pass-through.
    #[instrument(skip(self, prompt, prior), fields(subject = subject))]
    pub fn run(&self, prompt: &str, subject: &str, prior: SessionState) -> BootstrapOutcome {
        // Idempotence: a session for this subject is already live.
        if prior.is_active_for(subject) {
            tracing::debug!("session already initialized, skipping bootstrap");
            return BootstrapOutcome {
                success: true,
                state: prior,
                freshly_initialized: false,
            };
        }

        if !self.ensure_healthy() {
            tracing::warn!("synapse server unavailable, session not initialized");
            metrics::counter!("synapse_bootstrap_total", "status" => "unreachable").increment(1);
            return BootstrapOutcome {
                success: false,
                state: prior,
                freshly_initialized: false,
            };
        }

        // Diagnostic only: current graph sizes. Never affects control flow.
        if let Ok(counts) = self.client.graph_counts() {
            tracing::info!(
                dg_nodes = counts.dg_nodes,
                sg_nodes = counts.sg_nodes,
                pg_nodes = counts.pg_nodes,
                "current graph state"
            );
        }

        // Load-bearing: without a domain graph there is nothing to track
        // against.
        if let Err(e) = self.client.build_domain_graph(subject) {
            tracing::warn!(error = %e, "domain graph build failed, aborting bootstrap");
            metrics::counter!("synapse_bootstrap_total", "status" => "build_failed").increment(1);
            return BootstrapOutcome {
                success: false,
                state: prior,
                freshly_initialized: false,
            };
        }

        // Best-effort follow-ups.
        if let Err(e) = self.client.build_fallback_syllabus() {
            tracing::warn!(error = %e, "syllabus build failed, continuing");
        }
        if let Err(e) = self.client.align_embedding() {
            tracing::warn!(error = %e, "alignment failed, continuing");
        }
        if let Err(e) = self.client.enable_learning_mode() {
            tracing::warn!(error = %e, "learning mode toggle failed, continuing");
        }

        let session_id = generate_session_id();
        let state = SessionState::initialized_now(subject, session_id);

        if let Err(e) = self.store.save(&state) {
            tracing::warn!(error = %e, "failed to persist session state");
        }

        // Report the initiating prompt under the new session.
        let mut event = ChatEvent::user(prompt, subject);
        if let Some(id) = state.session_id.as_deref() {
            event = event.with_session(id);
        }
        if let Err(e) = self.client.track_chat(&event) {
            tracing::warn!(error = %e, "initial tracking call failed, continuing");
        }

        tracing::info!(
            session_id = state.session_id.as_deref().unwrap_or(""),
            "learning session initialized"
        );
        metrics::counter!("synapse_bootstrap_total", "status" => "success").increment(1);

        BootstrapOutcome {
            success: true,
            state,
            freshly_initialized: true,
        }
    }

    /// Checks server health, triggering a start and a bounded poll loop if
    /// the first check fails.
    fn ensure_healthy(&self) -> bool {
        if self.client.health_check() {
            return true;
        }

        tracing::warn!("synapse server not responding, attempting to start it");
        if let Err(e) = self.client.start_if_down() {
            tracing::warn!(error = %e, "could not launch synapse server");
        }

        for attempt in 1..=self.poll_attempts {
            std::thread::sleep(self.poll_interval);
            if self.client.health_check() {
                tracing::info!(attempt, "synapse server is up");
                return true;
            }
        }

        false
    }
}

/// Generates a session identifier from the current time, second precision.
fn generate_session_id() -> String {
    format!("session_{}", Utc::now().format("%Y%m%d%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GraphCounts, TrackResult};
    use crate::{Error, Result};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Fake knowledge service recording every call.
    #[derive(Default)]
    struct FakeService {
        calls: Mutex<Vec<String>>,
        healthy: bool,
        domain_build_ok: bool,
        side_calls_ok: bool,
    }

    impl FakeService {
        fn healthy() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                healthy: true,
                domain_build_ok: true,
                side_calls_ok: true,
            }
        }

        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn count_of(&self, call: &str) -> usize {
            self.calls().iter().filter(|c| c.as_str() == call).count()
        }

        fn fail(operation: &str) -> Error {
            Error::OperationFailed {
                operation: operation.to_string(),
                cause: "fake failure".to_string(),
            }
        }
    }

    impl KnowledgeService for FakeService {
        fn health_check(&self) -> bool {
            self.record("health");
            self.healthy
        }

        fn start_if_down(&self) -> Result<()> {
            self.record("start");
            Ok(())
        }

        fn build_domain_graph(&self, topic: &str) -> Result<()> {
            self.record(&format!("domain:{topic}"));
            if self.domain_build_ok {
                Ok(())
            } else {
                Err(Self::fail("build_domain_graph"))
            }
        }

        fn build_fallback_syllabus(&self) -> Result<()> {
            self.record("syllabus");
            if self.side_calls_ok {
                Ok(())
            } else {
                Err(Self::fail("build_fallback_syllabus"))
            }
        }

        fn align_embedding(&self) -> Result<()> {
            self.record("align");
            if self.side_calls_ok {
                Ok(())
            } else {
                Err(Self::fail("align_embedding"))
            }
        }

        fn enable_learning_mode(&self) -> Result<()> {
            self.record("learning_mode");
            if self.side_calls_ok {
                Ok(())
            } else {
                Err(Self::fail("enable_learning_mode"))
            }
        }

        fn graph_counts(&self) -> Result<GraphCounts> {
            self.record("counts");
            Ok(GraphCounts::default())
        }

        fn track_chat(&self, event: &ChatEvent) -> Result<TrackResult> {
            self.record(&format!(
                "track:{}:{}:{}",
                event.role,
                event.topic_hint,
                event.session_id.as_deref().unwrap_or("-")
            ));
            Ok(TrackResult::default())
        }
    }

    fn store_in(dir: &TempDir) -> SessionStore {
        SessionStore::new(
            dir.path().join("session.json"),
            dir.path().join("topic.txt"),
        )
    }

    fn fast_poll<'a, S: KnowledgeService>(
        client: &'a S,
        store: &'a SessionStore,
    ) -> BootstrapService<'a, S> {
        BootstrapService::new(client, store).with_health_poll(10, Duration::from_millis(1))
    }

    #[test]
    fn test_happy_path_initializes_and_persists() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let client = FakeService::healthy();
        let service = fast_poll(&client, &store);

        let outcome = service.run("teach me calculus", "calculus", SessionState::default());

        assert!(outcome.success);
        assert!(outcome.freshly_initialized);
        assert!(outcome.state.initialized);
        assert_eq!(outcome.state.subject.as_deref(), Some("calculus"));
        assert!(
            outcome
                .state
                .session_id
                .as_deref()
                .unwrap()
                .starts_with("session_")
        );
        assert!(outcome.state.started_at.is_some());

        // Persisted wholesale
        let loaded = store.load();
        assert_eq!(loaded, outcome.state);

        // One of each remote call, domain build tagged with the subject
        let calls = client.calls();
        assert_eq!(client.count_of("health"), 1);
        assert!(calls.contains(&"domain:calculus".to_string()));
        assert!(calls.contains(&"syllabus".to_string()));
        assert!(calls.contains(&"align".to_string()));
        assert!(calls.contains(&"learning_mode".to_string()));
    }

    #[test]
    fn test_initial_prompt_is_tracked_with_session_id() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let client = FakeService::healthy();
        let service = fast_poll(&client, &store);

        let outcome = service.run("teach me physics", "physics", SessionState::default());
        let session_id = outcome.state.session_id.unwrap();

        let expected = format!("track:user:physics:{session_id}");
        assert!(client.calls().contains(&expected));
    }

    #[test]
    fn test_idempotent_for_same_subject() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let client = FakeService::healthy();
        let service = fast_poll(&client, &store);

        let prior = SessionState::initialized_now("calculus", "session_x".to_string());
        let outcome = service.run("more calculus please", "calculus", prior.clone());

        assert!(outcome.success);
        assert!(!outcome.freshly_initialized);
        assert_eq!(outcome.state, prior);
        // Zero remote calls on the idempotent path
        assert!(client.calls().is_empty());
    }

    #[test]
    fn test_new_subject_rebuilds() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let client = FakeService::healthy();
        let service = fast_poll(&client, &store);

        let prior = SessionState::initialized_now("calculus", "session_x".to_string());
        let outcome = service.run("now teach me physics", "physics", prior);

        assert!(outcome.success);
        assert!(outcome.freshly_initialized);
        assert_eq!(outcome.state.subject.as_deref(), Some("physics"));
        assert!(client.calls().contains(&"domain:physics".to_string()));
    }

    #[test]
    fn test_unhealthy_server_exhausts_poll_budget() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let client = FakeService {
            calls: Mutex::new(Vec::new()),
            healthy: false,
            domain_build_ok: true,
            side_calls_ok: true,
        };
        let service = fast_poll(&client, &store);

        let prior = SessionState::default();
        let outcome = service.run("teach me biology", "biology", prior.clone());

        assert!(!outcome.success);
        assert!(!outcome.freshly_initialized);
        assert_eq!(outcome.state, prior);

        // Initial check plus ten polls, one start attempt, nothing else.
        assert_eq!(client.count_of("health"), 11);
        assert_eq!(client.count_of("start"), 1);
        assert_eq!(
            client
                .calls()
                .iter()
                .filter(|c| c.starts_with("domain"))
                .count(),
            0
        );

        // State file untouched
        assert_eq!(store.load(), SessionState::default());
    }

    #[test]
    fn test_domain_build_failure_aborts_without_persisting() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let client = FakeService {
            calls: Mutex::new(Vec::new()),
            healthy: true,
            domain_build_ok: false,
            side_calls_ok: true,
        };
        let service = fast_poll(&client, &store);

        let outcome = service.run("teach me statistics", "statistics", SessionState::default());

        assert!(!outcome.success);
        assert_eq!(outcome.state, SessionState::default());
        assert_eq!(store.load(), SessionState::default());
        // The best-effort follow-ups never ran
        assert_eq!(client.count_of("syllabus"), 0);
        assert_eq!(client.count_of("align"), 0);
    }

    #[test]
    fn test_side_call_failures_do_not_abort() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let client = FakeService {
            calls: Mutex::new(Vec::new()),
            healthy: true,
            domain_build_ok: true,
            side_calls_ok: false,
        };
        let service = fast_poll(&client, &store);

        let outcome = service.run("teach me economics", "economics", SessionState::default());

        assert!(outcome.success);
        assert!(outcome.state.initialized);
        assert!(store.load().initialized);
    }

    #[test]
    fn test_session_id_format() {
        let id = generate_session_id();
        assert!(id.starts_with("session_"));
        // session_ + YYYYMMDDHHMMSS
        assert_eq!(id.len(), "session_".len() + 14);
        assert!(id["session_".len()..].chars().all(|c| c.is_ascii_digit()));
    }
}
