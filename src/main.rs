//! Binary entry point for synapse-hook.
//!
//! Claude Code invokes this binary on hook events; it reads one payload
//! from stdin and writes the pass-through output to stdout. Hook
//! invocations always exit successfully, whatever happens internally.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr/print_stdout in the main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::time::Duration;
use synapse_hook::client::{KnowledgeService, SynapseClient};
use synapse_hook::config::HookConfig;
use synapse_hook::hooks::{HookHandler, PostToolUseHandler, UserPromptHandler};
use synapse_hook::observability;
use synapse_hook::storage::SessionStore;

/// Synapse hook - Claude Code hooks for the Synapse learning tracker.
#[derive(Parser)]
#[command(name = "synapse-hook")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "SYNAPSE_HOOK_CONFIG_PATH")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Handle Claude Code hooks.
    Hook {
        /// Hook event type.
        #[command(subcommand)]
        event: HookEvent,
    },

    /// Show server and session status.
    Status,

    /// Manage configuration.
    Config {
        /// Show current configuration.
        #[arg(long)]
        show: bool,
    },
}

/// Hook events.
#[derive(Subcommand)]
enum HookEvent {
    /// User prompt submit hook.
    UserPromptSubmit,
    /// Post tool use hook.
    PostToolUse,
}

/// Main entry point.
fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    observability::init(cli.verbose);

    let is_hook = matches!(cli.command, Commands::Hook { .. });
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            // Hook invocations must never fail: degrade to defaults and
            // keep the pass-through path alive.
            if is_hook {
                tracing::warn!(error = %e, "failed to load configuration, using defaults");
                HookConfig::default().with_env_overrides()
            } else {
                eprintln!("Failed to load configuration: {e}");
                return ExitCode::FAILURE;
            }
        },
    };

    match run_command(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(cli: Cli, config: &HookConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Hook { event } => {
            cmd_hook(&event, config);
            Ok(())
        },
        Commands::Status => cmd_status(config),
        Commands::Config { show } => cmd_config(config, show),
    }
}

/// Loads configuration.
fn load_config(path: Option<&str>) -> synapse_hook::Result<HookConfig> {
    // If a path is provided, load from that file
    if let Some(config_path) = path {
        if !config_path.trim().is_empty() {
            return HookConfig::load_from_file(std::path::Path::new(config_path))
                .map(HookConfig::with_env_overrides);
        }
    }

    // Otherwise, load from the default location
    Ok(HookConfig::load_default())
}

/// Hook command. Never fails: every error degrades to echoing stdin.
fn cmd_hook(event: &HookEvent, config: &HookConfig) {
    let input = read_hook_input();

    let client = SynapseClient::from_config(config);
    let store = SessionStore::from_config(config);

    let response = match event {
        HookEvent::UserPromptSubmit => UserPromptHandler::new(client, store)
            .with_server_url(&config.server_url)
            .with_health_poll(
                config.health_poll_attempts,
                Duration::from_millis(config.health_poll_interval_ms),
            )
            .handle(&input),
        HookEvent::PostToolUse => PostToolUseHandler::new(client, store).handle(&input),
    };

    match response {
        Ok(output) => println!("{output}"),
        Err(e) => {
            tracing::error!(error = %e, "hook handler failed, passing input through");
            println!("{input}");
        },
    }
}

/// Reads hook input from stdin, mapping empty input to an empty object.
fn read_hook_input() -> String {
    use std::io::Read;

    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        tracing::warn!(error = %e, "failed to read stdin");
    }

    if input.trim().is_empty() {
        "{}".to_string()
    } else {
        input
    }
}

/// Status command.
fn cmd_status(config: &HookConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Synapse Hook Status");
    println!("===================");
    println!();
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    let client = SynapseClient::from_config(config);
    let server_status = if client.health_check() {
        "Online"
    } else {
        "Offline"
    };
    println!("Server: {server_status}");
    println!("  URL: {}", config.server_url);

    if let Ok(counts) = client.graph_counts() {
        println!("Graphs:");
        println!("  Domain nodes:   {}", counts.dg_nodes);
        println!("  Syllabus nodes: {}", counts.sg_nodes);
        println!("  Personal nodes: {}", counts.pg_nodes);
    }

    let store = SessionStore::from_config(config);
    let state = store.load();
    let session_status = if state.initialized {
        "Initialized"
    } else {
        "Not initialized"
    };
    println!("Session: {session_status}");
    if let Some(subject) = state.subject.as_deref() {
        println!("  Subject: {subject}");
    }
    if let Some(session_id) = state.session_id.as_deref() {
        println!("  Id: {session_id}");
    }
    if let Some(topic) = store.current_topic() {
        println!("  Topic file: {topic}");
    }

    Ok(())
}

/// Config command.
fn cmd_config(config: &HookConfig, show: bool) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("server_url = {:?}", config.server_url);
        println!("timeout_ms = {}", config.timeout_ms);
        println!("connect_timeout_ms = {}", config.connect_timeout_ms);
        println!("health_poll_attempts = {}", config.health_poll_attempts);
        println!("health_poll_interval_ms = {}", config.health_poll_interval_ms);
        println!("server_command = {:?}", config.server_command);
        println!("state_file = {:?}", config.state_file);
        println!("topic_file = {:?}", config.topic_file);
    } else {
        println!("Use 'synapse-hook config --show' to view the configuration");
    }
    Ok(())
}
