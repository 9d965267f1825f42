//! Operation log
//!
//! Every dispatched hook event appends one JSON-lines record to
//! `.warden/operations.jsonl`. `warden observe` replays and tails it.

use chrono::{Local, Utc};
use colored::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::OplogConfig;
use crate::hook::HookEvent;
use crate::state::StateStore;

pub const OPLOG_DOC: &str = "operations.jsonl";

/// One logged operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpRecord {
    /// Timestamp (UTC ISO 8601)
    pub timestamp: String,
    /// Local time for display
    pub local_time: String,
    /// Event type
    pub event_type: String,
    /// Session ID if available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Tool name if applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// Dispatch outcome: allow, block, advisory, error
    pub decision: String,
    /// Block or advisory reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Raw event payload (optional, can be large)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl OpRecord {
    pub fn from_hook(
        hook_event: HookEvent,
        payload: &serde_json::Value,
        decision: &str,
        reason: Option<&str>,
        include_payload: bool,
    ) -> Self {
        let now = Utc::now();
        let local = Local::now();

        Self {
            timestamp: now.to_rfc3339(),
            local_time: local.format("%Y-%m-%d %H:%M:%S").to_string(),
            event_type: format!("{:?}", hook_event),
            session_id: crate::hook::payload_str(payload, "session_id", "sessionId").map(String::from),
            tool_name: crate::hook::payload_str(payload, "tool_name", "toolName").map(String::from),
            decision: decision.to_string(),
            reason: reason.map(String::from),
            payload: if include_payload { Some(payload.clone()) } else { None },
        }
    }

    /// Format for terminal display
    pub fn format_display(&self) -> String {
        let event_colored = match self.event_type.as_str() {
            "SessionStart" => self.event_type.green(),
            "SessionEnd" => self.event_type.red(),
            "PreToolUse" => self.event_type.cyan(),
            "PostToolUse" => self.event_type.blue(),
            "UserPromptSubmit" => self.event_type.magenta(),
            "Stop" | "SubagentStop" => self.event_type.yellow(),
            _ => self.event_type.normal(),
        };

        let decision_colored = match self.decision.as_str() {
            "block" => self.decision.red().bold(),
            "advisory" => self.decision.yellow(),
            "error" => self.decision.red(),
            _ => self.decision.dimmed(),
        };

        let mut parts = vec![
            self.local_time.dimmed().to_string(),
            event_colored.to_string(),
            decision_colored.to_string(),
        ];

        if let Some(ref session) = self.session_id {
            parts.push(format!("[{}]", &session[..8.min(session.len())]).dimmed().to_string());
        }

        if let Some(ref tool) = self.tool_name {
            parts.push(tool.bold().to_string());
        }

        if let Some(ref reason) = self.reason {
            parts.push(reason.clone());
        }

        parts.join(" ")
    }
}

/// Append-only log over the state store
pub struct OpLog {
    config: OplogConfig,
    store: Arc<dyn StateStore>,
}

impl OpLog {
    pub fn new(config: OplogConfig, store: Arc<dyn StateStore>) -> Self {
        Self { config, store }
    }

    /// Append one record. Logging failures never affect the hook outcome.
    pub fn emit(&self, hook_event: HookEvent, payload: &serde_json::Value, decision: &str, reason: Option<&str>) {
        if !self.config.enabled {
            return;
        }

        let record = OpRecord::from_hook(hook_event, payload, decision, reason, self.config.include_payload);
        match serde_json::to_value(&record) {
            Ok(value) => {
                if let Err(e) = self.store.append_line(OPLOG_DOC, &value) {
                    log::warn!("Failed to append operation record: {}", e);
                }
            }
            Err(e) => log::warn!("Failed to serialize operation record: {}", e),
        }
    }

    pub fn records(&self) -> eyre::Result<Vec<OpRecord>> {
        Ok(self
            .store
            .read_lines(OPLOG_DOC)?
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_record_from_hook() {
        let payload = json!({
            "session_id": "test-123",
            "tool_name": "Bash"
        });

        let record = OpRecord::from_hook(HookEvent::PreToolUse, &payload, "block", Some("denied"), false);

        assert_eq!(record.event_type, "PreToolUse");
        assert_eq!(record.session_id, Some("test-123".to_string()));
        assert_eq!(record.tool_name, Some("Bash".to_string()));
        assert_eq!(record.decision, "block");
        assert!(record.payload.is_none());
    }

    #[test]
    fn test_emit_and_read_back() {
        let store = Arc::new(MemoryStore::new());
        let oplog = OpLog::new(OplogConfig::default(), store);

        oplog.emit(HookEvent::SessionStart, &json!({"session_id": "s1"}), "allow", None);
        oplog.emit(HookEvent::PreToolUse, &json!({"session_id": "s1"}), "block", Some("nope"));

        let records = oplog.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].reason.as_deref(), Some("nope"));
    }

    #[test]
    fn test_disabled_emits_nothing() {
        let store = Arc::new(MemoryStore::new());
        let oplog = OpLog::new(
            OplogConfig {
                enabled: false,
                include_payload: false,
            },
            store,
        );

        oplog.emit(HookEvent::SessionStart, &json!({}), "allow", None);
        assert!(oplog.records().unwrap().is_empty());
    }

    #[test]
    fn test_format_display_contains_decision() {
        let record = OpRecord::from_hook(HookEvent::PreToolUse, &json!({"session_id": "abcd1234"}), "block", Some("denied"), false);
        let display = record.format_display();
        assert!(display.contains("abcd1234"));
        assert!(display.contains("denied"));
    }
}
