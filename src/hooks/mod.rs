//! Claude Code hooks.
//!
//! Implements handlers for the Claude Code hook events this crate cares
//! about:
//!
//! | Event | Handler | Behavior |
//! |-------|---------|----------|
//! | `UserPromptSubmit` | [`UserPromptHandler`] | Extract subject, bootstrap session, track the prompt |
//! | `PostToolUse` | [`PostToolUseHandler`] | Track substantial tool output as assistant text |
//!
//! Handlers read one payload string (JSON, with a raw-text fallback) and
//! return the pass-through output for stdout. They never fail the
//! invocation: anything that goes wrong degrades to echoing the input, with
//! diagnostics on the tracing (stderr) channel. Claude Code pipes the
//! handler's stdout onward, so the output must always be a usable,
//! non-empty string.

mod post_tool_use;
mod subject;
mod user_prompt;

pub use post_tool_use::PostToolUseHandler;
pub use subject::extract_subject;
pub use user_prompt::UserPromptHandler;

use crate::Result;

/// Trait for hook handlers.
pub trait HookHandler: Send + Sync {
    /// The hook event type this handler processes.
    fn event_type(&self) -> &'static str;

    /// Handles the hook event.
    ///
    /// # Errors
    ///
    /// Returns an error if handling fails.
    fn handle(&self, input: &str) -> Result<String>;
}

/// Pass-through output for a payload that needs no handling.
///
/// Empty input maps to `{}` so stdout always carries something.
pub(crate) fn passthrough(input: &str) -> String {
    if input.trim().is_empty() {
        "{}".to_string()
    } else {
        input.to_string()
    }
}
