//! Hook event handling
//!
//! Hooks are lifecycle events fired by Claude Code that warden intercepts.
//! Each event spawns a fresh `warden hook dispatch` process which reads the
//! JSON payload from stdin, runs the registered handlers, and signals the
//! outcome through its exit code (0 = allow, 2 = block).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod dispatch;
pub mod format;
pub mod guard;
pub mod inject;
pub mod session;

use crate::config::Config;
use crate::oplog::OpLog;
use crate::policy::PathPolicy;
use crate::state::{JsonFileStore, SessionState, StateStore, WarningTracker};

/// Hook event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum HookEvent {
    PreToolUse,
    PostToolUse,
    Stop,
    SessionStart,
    SessionEnd,
    SubagentStop,
    Notification,
    UserPromptSubmit,
    PreCompact,
}

impl HookEvent {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "pretooluse" => Some(Self::PreToolUse),
            "posttooluse" => Some(Self::PostToolUse),
            "stop" => Some(Self::Stop),
            "sessionstart" => Some(Self::SessionStart),
            "sessionend" => Some(Self::SessionEnd),
            "subagentstop" => Some(Self::SubagentStop),
            "notification" => Some(Self::Notification),
            "userpromptsubmit" => Some(Self::UserPromptSubmit),
            "precompact" => Some(Self::PreCompact),
            _ => None,
        }
    }

    pub fn all() -> &'static [HookEvent] {
        &[
            Self::PreToolUse,
            Self::PostToolUse,
            Self::Stop,
            Self::SessionStart,
            Self::SessionEnd,
            Self::SubagentStop,
            Self::Notification,
            Self::UserPromptSubmit,
            Self::PreCompact,
        ]
    }

    /// Events whose stdout is interpreted as additional context for the
    /// assistant's next turn.
    pub fn supports_context_output(&self) -> bool {
        matches!(self, Self::UserPromptSubmit | Self::SessionStart)
    }
}

/// Result of a hook handler
#[derive(Debug, Clone)]
pub enum HookResult {
    /// Allow the action, optionally with context for the assistant
    Allow { context: Option<String> },
    /// Block the action (exit code 2)
    Block { message: String },
    /// Error occurred (logged but allows action)
    Error { message: String },
}

impl HookResult {
    pub fn allow() -> Self {
        HookResult::Allow { context: None }
    }

    pub fn allow_with_context(context: String) -> Self {
        HookResult::Allow { context: Some(context) }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            HookResult::Allow { .. } => 0,
            HookResult::Block { .. } => 2,
            HookResult::Error { .. } => 0, // Errors fail open
        }
    }
}

/// Everything a handler needs, passed explicitly instead of living in
/// global singletons.
pub struct HookContext {
    pub config: Config,
    pub project_root: PathBuf,
    store: Arc<dyn StateStore>,
    policy: PathPolicy,
    oplog: OpLog,
}

impl HookContext {
    pub fn new(config: Config, project_root: PathBuf) -> Self {
        let store: Arc<dyn StateStore> = Arc::new(JsonFileStore::for_project(&project_root));
        Self::with_store(config, project_root, store)
    }

    /// Test seam: build a context over any store.
    pub fn with_store(config: Config, project_root: PathBuf, store: Arc<dyn StateStore>) -> Self {
        let policy = PathPolicy::from_config(&config.policy, &project_root);
        let oplog = OpLog::new(config.oplog.clone(), Arc::clone(&store));
        Self {
            config,
            project_root,
            store,
            policy,
            oplog,
        }
    }

    pub fn policy(&self) -> &PathPolicy {
        &self.policy
    }

    pub fn oplog(&self) -> &OpLog {
        &self.oplog
    }

    pub fn session_state(&self) -> SessionState {
        SessionState::new(Arc::clone(&self.store), self.config.injection.message_threshold)
    }

    pub fn warnings(&self) -> WarningTracker {
        WarningTracker::new(Arc::clone(&self.store))
    }
}

/// A hook handler
pub trait HookHandler: Send + Sync {
    /// Handler name shown by `warden hook list`.
    fn name(&self) -> &'static str;
    fn handles(&self, event: HookEvent) -> bool;
    fn handle(&self, event: HookEvent, payload: &serde_json::Value, ctx: &HookContext) -> HookResult;
}

/// Build the handler set from the config's per-feature switches.
pub fn registered_handlers(config: &Config) -> Vec<Box<dyn HookHandler>> {
    vec![
        Box::new(guard::GuardHandler::new(config.hooks.guard_enabled)),
        Box::new(inject::InjectHandler::new(config.hooks.inject_enabled)),
        Box::new(session::LifecycleHandler::new(config.hooks.session_enabled)),
        Box::new(format::FormatHandler::new(config.hooks.format_enabled)),
    ]
}

/// Common payload fields, in both snake_case and camelCase spellings.
pub fn payload_str<'a>(payload: &'a serde_json::Value, snake: &str, camel: &str) -> Option<&'a str> {
    payload
        .get(snake)
        .or_else(|| payload.get(camel))
        .and_then(|v| v.as_str())
}

pub fn session_id(payload: &serde_json::Value) -> &str {
    payload_str(payload, "session_id", "sessionId").unwrap_or("unknown")
}

pub fn tool_name(payload: &serde_json::Value) -> &str {
    payload_str(payload, "tool_name", "toolName").unwrap_or("")
}

pub fn transcript_path(payload: &serde_json::Value) -> Option<&str> {
    payload_str(payload, "transcript_path", "transcriptPath")
}

pub fn tool_input(payload: &serde_json::Value) -> Option<&serde_json::Value> {
    payload.get("tool_input").or_else(|| payload.get("toolInput"))
}

/// The file path a tool operates on, if any.
pub fn tool_file_path(payload: &serde_json::Value) -> Option<&Path> {
    tool_input(payload)
        .and_then(|v| v.get("file_path").or_else(|| v.get("filePath")))
        .and_then(|v| v.as_str())
        .map(Path::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_parse_variants() {
        assert_eq!(HookEvent::parse("pre-tool-use"), Some(HookEvent::PreToolUse));
        assert_eq!(HookEvent::parse("PreToolUse"), Some(HookEvent::PreToolUse));
        assert_eq!(HookEvent::parse("user_prompt_submit"), Some(HookEvent::UserPromptSubmit));
        assert_eq!(HookEvent::parse("bogus"), None);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(HookResult::allow().exit_code(), 0);
        assert_eq!(
            HookResult::Block {
                message: "no".to_string()
            }
            .exit_code(),
            2
        );
        assert_eq!(
            HookResult::Error {
                message: "oops".to_string()
            }
            .exit_code(),
            0
        );
    }

    #[test]
    fn test_payload_accessors_both_spellings() {
        let snake = json!({"session_id": "abc", "tool_name": "Bash", "tool_input": {"file_path": "/tmp/x"}});
        let camel = json!({"sessionId": "abc", "toolName": "Bash", "toolInput": {"filePath": "/tmp/x"}});

        for payload in [snake, camel] {
            assert_eq!(session_id(&payload), "abc");
            assert_eq!(tool_name(&payload), "Bash");
            assert_eq!(tool_file_path(&payload), Some(Path::new("/tmp/x")));
        }
    }

    #[test]
    fn test_context_output_events() {
        assert!(HookEvent::UserPromptSubmit.supports_context_output());
        assert!(HookEvent::SessionStart.supports_context_output());
        assert!(!HookEvent::PreToolUse.supports_context_output());
    }
}
