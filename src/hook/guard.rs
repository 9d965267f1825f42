//! Path-access and destructive-command guard
//!
//! Runs on PreToolUse. File tools are checked against the configured path
//! policy; Bash commands are checked against the attack pattern table and
//! any `rm` targets are checked as delete operations. Policy violations
//! block (exit code 2); everything else is advisory.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use super::{session_id, tool_file_path, tool_input, tool_name, HookContext, HookEvent, HookHandler, HookResult};
use crate::policy::{Access, Operation};

/// Attack patterns to check against
struct AttackPattern {
    patterns: Vec<Regex>,
    description: &'static str,
}

static ATTACK_PATTERNS: Lazy<Vec<AttackPattern>> = Lazy::new(|| {
    vec![
        // Catastrophic - always block
        AttackPattern {
            patterns: vec![
                Regex::new(r"rm\s+(-rf?|--recursive)\s+[/~]").unwrap(),
                Regex::new(r"rm\s+(-rf?|--recursive)\s+\*").unwrap(),
                Regex::new(r">\s*/dev/sd[a-z]").unwrap(),
                Regex::new(r"mkfs\.").unwrap(),
                Regex::new(r"dd\s+if=.*of=/dev").unwrap(),
            ],
            description: "Catastrophic deletion/destruction",
        },
        // Remote code execution
        AttackPattern {
            patterns: vec![
                Regex::new(r"curl.*\|\s*(ba)?sh").unwrap(),
                Regex::new(r"wget.*\|\s*(ba)?sh").unwrap(),
                Regex::new(r"curl.*-o\s+/tmp/.*&&.*sh").unwrap(),
            ],
            description: "Remote code execution",
        },
        // Credential theft
        AttackPattern {
            patterns: vec![
                Regex::new(r"cat\s+.*\.ssh/(id_|authorized)").unwrap(),
                Regex::new(r"cat\s+.*/\.aws/credentials").unwrap(),
                Regex::new(r"cat\s+.*/\.netrc").unwrap(),
                Regex::new(r"base64.*\.ssh").unwrap(),
            ],
            description: "Credential access",
        },
        // History rewriting
        AttackPattern {
            patterns: vec![
                Regex::new(r"git\s+push\s+.*--force").unwrap(),
                Regex::new(r"git\s+reset\s+--hard\s+origin").unwrap(),
            ],
            description: "Destructive git operation",
        },
    ]
});

/// Matches an rm invocation anywhere in a (possibly chained) command line.
static RM_INVOCATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|[;&|]\s*)rm\s+([^;&|]+)").unwrap());

/// File names that get a one-time advisory when read.
const SENSITIVE_NAMES: &[&str] = &[".env", "credentials", "id_rsa", "id_ed25519", ".netrc", ".npmrc"];

pub struct GuardHandler {
    enabled: bool,
}

impl GuardHandler {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn check_file_tool(&self, path: &Path, operation: Operation, payload: &serde_json::Value, ctx: &HookContext) -> HookResult {
        match ctx.policy().check(path, operation) {
            Access::Deny { reason } => HookResult::Block {
                message: format!("BLOCKED ({}): {}", operation, reason),
            },
            Access::Allow => {
                if operation == Operation::Read {
                    self.advise_sensitive_read(path, payload, ctx);
                }
                HookResult::allow()
            }
        }
    }

    /// Non-blocking notice when the assistant reads a sensitive-looking file.
    /// Shown once per session per file name.
    fn advise_sensitive_read(&self, path: &Path, payload: &serde_json::Value, ctx: &HookContext) {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return;
        };

        if !SENSITIVE_NAMES.iter().any(|s| name.contains(s)) {
            return;
        }

        let warning_type = format!("sensitive-read:{}", name);
        match ctx.warnings().should_warn(session_id(payload), &warning_type) {
            Ok(true) => {
                eprintln!("warden: note: reading sensitive-looking file {}", path.display());
                ctx.oplog().emit(HookEvent::PreToolUse, payload, "advisory", Some(&warning_type));
            }
            Ok(false) => {}
            Err(e) => log::warn!("Warning tracker failed: {}", e),
        }
    }

    fn check_bash(&self, command: &str, ctx: &HookContext) -> HookResult {
        for pattern in ATTACK_PATTERNS.iter() {
            for regex in &pattern.patterns {
                if regex.is_match(command) {
                    return HookResult::Block {
                        message: format!("BLOCKED: {}", pattern.description),
                    };
                }
            }
        }

        // rm targets go through the delete policy
        for target in rm_targets(command) {
            if let Access::Deny { reason } = ctx.policy().check(Path::new(&target), Operation::Delete) {
                return HookResult::Block {
                    message: format!("BLOCKED (delete): {}", reason),
                };
            }
        }

        HookResult::allow()
    }
}

impl HookHandler for GuardHandler {
    fn name(&self) -> &'static str {
        "guard"
    }

    fn handles(&self, event: HookEvent) -> bool {
        self.enabled && event == HookEvent::PreToolUse
    }

    fn handle(&self, _event: HookEvent, payload: &serde_json::Value, ctx: &HookContext) -> HookResult {
        let tool = tool_name(payload);

        match tool {
            "Write" | "Edit" | "MultiEdit" | "NotebookEdit" => match tool_file_path(payload) {
                Some(path) => self.check_file_tool(path, Operation::Write, payload, ctx),
                None => HookResult::allow(),
            },
            "Read" => match tool_file_path(payload) {
                Some(path) => self.check_file_tool(path, Operation::Read, payload, ctx),
                None => HookResult::allow(),
            },
            "Bash" => {
                let command = tool_input(payload)
                    .and_then(|v| v.get("command"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                self.check_bash(command, ctx)
            }
            _ => HookResult::allow(),
        }
    }
}

/// Extract the non-flag targets of every `rm` invocation in a command line.
fn rm_targets(command: &str) -> Vec<String> {
    let mut targets = Vec::new();
    for caps in RM_INVOCATION.captures_iter(command) {
        for token in caps[1].split_whitespace() {
            if !token.starts_with('-') {
                targets.push(token.to_string());
            }
        }
    }
    targets
}
