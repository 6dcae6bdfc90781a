//! Session state persistence.
//!
//! Two tiny files in the working directory: a JSON session state file and a
//! plain-text topic file carrying the active topic across invocations. Both
//! follow read-then-write-whole semantics; an invocation reads once at start
//! and writes at most once. Concurrent hook invocations can race on these
//! files; that is accepted, not coordinated.

use crate::models::SessionState;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Reads and writes the session state and topic files.
pub struct SessionStore {
    /// Path to the JSON state file.
    state_path: PathBuf,
    /// Path to the plain-text topic file.
    topic_path: PathBuf,
}

impl SessionStore {
    /// Creates a store over the given file paths.
    #[must_use]
    pub fn new(state_path: impl Into<PathBuf>, topic_path: impl Into<PathBuf>) -> Self {
        Self {
            state_path: state_path.into(),
            topic_path: topic_path.into(),
        }
    }

    /// Creates a store from hook configuration.
    #[must_use]
    pub fn from_config(config: &crate::config::HookConfig) -> Self {
        Self::new(config.state_file.clone(), config.topic_file.clone())
    }

    /// Loads the persisted session state.
    ///
    /// A missing, unreadable, or corrupt file degrades to the default
    /// (uninitialized) state rather than failing the hook.
    #[must_use]
    pub fn load(&self) -> SessionState {
        match std::fs::read_to_string(&self.state_path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!(
                    path = %self.state_path.display(),
                    error = %e,
                    "corrupt session state file, starting fresh"
                );
                SessionState::default()
            }),
            Err(_) => SessionState::default(),
        }
    }

    /// Persists the session state, overwriting any previous content.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, state: &SessionState) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(state).map_err(|e| Error::OperationFailed {
                operation: "serialize_session_state".to_string(),
                cause: e.to_string(),
            })?;
        std::fs::write(&self.state_path, contents).map_err(|e| Error::OperationFailed {
            operation: "write_session_state".to_string(),
            cause: e.to_string(),
        })
    }

    /// Returns the topic recorded in the topic file, if any.
    #[must_use]
    pub fn current_topic(&self) -> Option<String> {
        let topic = std::fs::read_to_string(&self.topic_path).ok()?;
        let topic = topic.trim();
        if topic.is_empty() {
            None
        } else {
            Some(topic.to_string())
        }
    }

    /// Records the topic for future invocations.
    ///
    /// Only writes when no topic file exists yet: the first extracted subject
    /// wins for the lifetime of the workspace. Write failures are logged and
    /// swallowed.
    pub fn remember_topic(&self, topic: &str) {
        if self.topic_path.exists() {
            return;
        }
        if let Err(e) = std::fs::write(&self.topic_path, topic) {
            tracing::warn!(
                path = %self.topic_path.display(),
                error = %e,
                "failed to write topic file"
            );
        }
    }

    /// The state file path.
    #[must_use]
    pub fn state_path(&self) -> &Path {
        &self.state_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> SessionStore {
        SessionStore::new(
            dir.path().join("session.json"),
            dir.path().join("topic.txt"),
        )
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.load(), SessionState::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let state = SessionState::initialized_now("calculus", "session_20260827".to_string());
        store.save(&state).unwrap();

        let loaded = store.load();
        assert!(loaded.initialized);
        assert_eq!(loaded.subject.as_deref(), Some("calculus"));
        assert_eq!(loaded.session_id.as_deref(), Some("session_20260827"));
        assert!(loaded.started_at.is_some());
    }

    #[test]
    fn test_corrupt_file_returns_default() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(dir.path().join("session.json"), "not json {{").unwrap();
        assert_eq!(store.load(), SessionState::default());
    }

    #[test]
    fn test_save_overwrites_wholesale() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let first = SessionState::initialized_now("calculus", "session_a".to_string());
        store.save(&first).unwrap();
        let second = SessionState::initialized_now("physics", "session_b".to_string());
        store.save(&second).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.subject.as_deref(), Some("physics"));
        assert_eq!(loaded.session_id.as_deref(), Some("session_b"));
    }

    #[test]
    fn test_topic_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert_eq!(store.current_topic(), None);
        store.remember_topic("linear algebra");
        assert_eq!(store.current_topic().as_deref(), Some("linear algebra"));
    }

    #[test]
    fn test_first_topic_wins() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.remember_topic("calculus");
        store.remember_topic("physics");
        assert_eq!(store.current_topic().as_deref(), Some("calculus"));
    }

    #[test]
    fn test_blank_topic_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(dir.path().join("topic.txt"), "  \n").unwrap();
        assert_eq!(store.current_topic(), None);
    }

    #[test]
    fn test_save_to_unwritable_path_errors() {
        let store = SessionStore::new("/nonexistent-dir/session.json", "/nonexistent-dir/topic");
        let result = store.save(&SessionState::default());
        assert!(result.is_err());
    }
}
