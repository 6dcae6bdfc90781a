//! Configuration management.

use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration for the hook binary.
#[derive(Debug, Clone)]
pub struct HookConfig {
    /// Base URL of the Synapse server.
    pub server_url: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Health poll attempts after a server start is triggered.
    pub health_poll_attempts: u32,
    /// Interval between health polls in milliseconds.
    pub health_poll_interval_ms: u64,
    /// Command used to start the server when it is down.
    pub server_command: Vec<String>,
    /// Path to the session state file.
    pub state_file: PathBuf,
    /// Path to the plain-text topic file.
    pub topic_file: PathBuf,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:3001".to_string(),
            timeout_ms: 10_000,
            connect_timeout_ms: 3_000,
            health_poll_attempts: 10,
            health_poll_interval_ms: 1_000,
            server_command: vec!["npm".to_string(), "start".to_string()],
            state_file: PathBuf::from(".synapse-session.json"),
            topic_file: PathBuf::from(".synapse-topic"),
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Server base URL.
    pub server_url: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,
    /// Health poll attempts.
    pub health_poll_attempts: Option<u32>,
    /// Health poll interval in milliseconds.
    pub health_poll_interval_ms: Option<u64>,
    /// Server start command.
    pub server_command: Option<Vec<String>>,
    /// Session state file path.
    pub state_file: Option<String>,
    /// Topic file path.
    pub topic_file: Option<String>,
}

impl HookConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &std::path::Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: e.to_string(),
            })?;

        let file: ConfigFile =
            toml::from_str(&contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/synapse-hook/` on macOS)
    /// 2. XDG config dir (`~/.config/synapse-hook/` for Unix compatibility)
    ///
    /// Returns default configuration (with environment overrides applied)
    /// if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        Self::find_config_file()
            .and_then(|path| Self::load_from_file(&path).ok())
            .unwrap_or_default()
            .with_env_overrides()
    }

    /// Locates the config file in the default search paths.
    fn find_config_file() -> Option<PathBuf> {
        let base_dirs = directories::BaseDirs::new()?;

        let platform_config = base_dirs
            .config_dir()
            .join("synapse-hook")
            .join("config.toml");
        if platform_config.exists() {
            return Some(platform_config);
        }

        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("synapse-hook")
            .join("config.toml");
        if xdg_config.exists() {
            return Some(xdg_config);
        }

        None
    }

    /// Converts a `ConfigFile` to `HookConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(server_url) = file.server_url {
            config.server_url = server_url;
        }
        if let Some(timeout_ms) = file.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        if let Some(connect_timeout_ms) = file.connect_timeout_ms {
            config.connect_timeout_ms = connect_timeout_ms;
        }
        if let Some(attempts) = file.health_poll_attempts {
            config.health_poll_attempts = attempts;
        }
        if let Some(interval) = file.health_poll_interval_ms {
            config.health_poll_interval_ms = interval;
        }
        if let Some(command) = file.server_command {
            if !command.is_empty() {
                config.server_command = command;
            }
        }
        if let Some(state_file) = file.state_file {
            config.state_file = PathBuf::from(state_file);
        }
        if let Some(topic_file) = file.topic_file {
            config.topic_file = PathBuf::from(topic_file);
        }

        config
    }

    /// Applies environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("SYNAPSE_URL") {
            if !url.trim().is_empty() {
                self.server_url = url;
            }
        }
        if let Ok(v) = std::env::var("SYNAPSE_HOOK_TIMEOUT_MS") {
            if let Ok(timeout_ms) = v.parse::<u64>() {
                self.timeout_ms = timeout_ms;
            }
        }
        self
    }

    /// Sets the server URL.
    #[must_use]
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// Sets the session state file path.
    #[must_use]
    pub fn with_state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = path.into();
        self
    }

    /// Sets the topic file path.
    #[must_use]
    pub fn with_topic_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.topic_file = path.into();
        self
    }
}
