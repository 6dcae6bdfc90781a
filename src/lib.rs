//! # Synapse Hook
//!
//! Claude Code hooks for the Synapse learning tracker.
//!
//! Synapse watches an interactive assistant session, guesses what the user
//! is trying to learn, and mirrors the conversation into a local knowledge
//! server that builds domain and syllabus graphs. This crate is the hook
//! side of that arrangement:
//!
//! - Extracts a learning subject from prompt text via an ordered table of
//!   intent patterns with a fixed fallback subject list.
//! - Bootstraps a tracking session against the Synapse server on the first
//!   learning prompt (health check, domain graph build, best-effort syllabus
//!   and alignment calls).
//! - Forwards conversation turns to the server's chat ingestion endpoint.
//!
//! Every hook invocation is a short-lived, single-threaded process. The one
//! hard guarantee is pass-through: whatever arrives on stdin is echoed back
//! on stdout (possibly with a short status annotation) and the process exits
//! successfully, no matter what the server or the filesystem does.
//!
//! ## Example
//!
//! ```rust
//! use synapse_hook::hooks::extract_subject;
//!
//! let subject = extract_subject("I want to learn about linear algebra step by step");
//! assert_eq!(subject.as_deref(), Some("linear algebra"));
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod client;
pub mod config;
pub mod hooks;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use client::{KnowledgeService, SynapseClient};
pub use config::HookConfig;
pub use models::{ChatEvent, GraphCounts, SessionState, TrackResult};
pub use services::{BootstrapOutcome, BootstrapService};
pub use storage::SessionStore;

/// Error type for synapse-hook operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed payload fields, unparseable config values |
/// | `OperationFailed` | Server unreachable/not-ok, state file I/O errors, spawn failures |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A hook payload field has the wrong type
    /// - A configuration value cannot be parsed
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - The Synapse server is unreachable or returns a non-ok envelope
    /// - State file I/O fails
    /// - The server process cannot be spawned
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for synapse-hook operations.
pub type Result<T> = std::result::Result<T, Error>;
