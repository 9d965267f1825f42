use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::policy::Operation;

/// Output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl OutputFormat {
    /// Resolve the effective output format.
    /// If user specified a format, use it.
    /// Otherwise: TTY → Text, non-TTY (pipe) → Json
    pub fn resolve(user_choice: Option<OutputFormat>) -> OutputFormat {
        match user_choice {
            Some(fmt) => fmt,
            None => {
                if std::io::stdout().is_terminal() {
                    OutputFormat::Text
                } else {
                    OutputFormat::Json
                }
            }
        }
    }
}

#[derive(Parser)]
#[command(
    name = "warden",
    about = "Hook-based guardrails and context injection for Claude Code",
    version = env!("GIT_DESCRIBE"),
    after_help = "Logs are written to: ~/.local/share/warden/logs/warden.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to warden.yaml config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, help = "Suppress non-error output")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize warden configuration
    Init {
        /// Directory to initialize (defaults to ~/.config/warden)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Handle hook events from Claude Code
    Hook {
        #[command(subcommand)]
        action: HookAction,
    },

    /// Inspect and evaluate the path access policy
    Policy {
        #[command(subcommand)]
        action: PolicyAction,
    },

    /// Inspect and manage per-project session state
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Replay and tail the operation log
    Observe {
        /// Filter by event type substring
        #[arg(long)]
        filter: Option<String>,

        /// Show the last N records before tailing
        #[arg(long, default_value = "20")]
        last: usize,

        /// Include raw payloads in output
        #[arg(long)]
        payload: bool,

        /// Exit after printing instead of tailing
        #[arg(long)]
        no_follow: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show state-file summary
    Status {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum HookAction {
    /// Dispatch a hook event to handlers
    Dispatch {
        /// Event type (pre-tool-use, post-tool-use, stop, session-start, etc.)
        event: String,

        /// Event payload JSON (reads from stdin if not provided)
        #[arg(long)]
        payload: Option<String>,
    },

    /// List registered hook handlers
    List {
        /// Filter by event type
        #[arg(long)]
        event: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PolicyAction {
    /// Evaluate a path against the policy
    Check {
        /// Path to check
        path: PathBuf,

        /// Operation to check
        #[arg(long, short = 'O', value_enum, default_value = "write")]
        operation: Operation,
    },

    /// Show the loaded rule lists
    Show,
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// Show the current injection state
    Show {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Clear injection state and warnings
    Reset,

    /// Force context injection on the next prompt
    Inject {
        /// Reason recorded with the request
        #[arg(long, default_value = "manual request")]
        reason: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },
}
