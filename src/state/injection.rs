//! Injection decision state machine
//!
//! Tracks whether extra context should be re-injected into the assistant's
//! next turn. The state is a small JSON document read on every prompt and
//! persisted after every mutation.

use eyre::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::StateStore;

const DOC: &str = "injection_state.json";

/// Persisted injection state, one per project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectionState {
    /// Forced-injection flag set by external triggers (subagent completion,
    /// context compaction, `warden session inject`).
    pub inject_next: bool,
    /// Prompts seen since the last injection.
    pub messages_since_injection: u32,
    /// Transcript path recorded at the last injection.
    pub last_transcript_path: Option<String>,
    /// Why the next/last injection happened.
    pub reason: String,
}

/// Handle over the persisted injection state.
pub struct SessionState {
    store: Arc<dyn StateStore>,
    threshold: u32,
}

impl SessionState {
    pub fn new(store: Arc<dyn StateStore>, threshold: u32) -> Self {
        Self { store, threshold }
    }

    pub fn load(&self) -> Result<InjectionState> {
        match self.store.read_doc(DOC)? {
            Some(value) => Ok(serde_json::from_value(value).unwrap_or_default()),
            None => Ok(InjectionState::default()),
        }
    }

    fn save(&self, state: &InjectionState) -> Result<()> {
        self.store.write_doc(DOC, &serde_json::to_value(state)?)
    }

    /// Decide whether context should be injected into the next turn.
    ///
    /// Returns `Some(reason)` when injection is due:
    /// - the transcript path changed since the last mark (new conversation),
    /// - a forced-injection flag was set by an external trigger, or
    /// - `threshold` or more prompts have elapsed since the last injection.
    ///
    /// Each firing condition flips the state and persists immediately, so the
    /// decision is returned exactly once until the next trigger or mark.
    pub fn should_inject(&self, transcript_path: Option<&str>) -> Result<Option<String>> {
        let mut state = self.load()?;

        let path_changed = match (transcript_path, state.last_transcript_path.as_deref()) {
            (Some(current), Some(last)) => current != last,
            (Some(_), None) => true,
            (None, _) => false,
        };

        if path_changed {
            state.last_transcript_path = transcript_path.map(String::from);
            state.inject_next = false;
            state.reason = "transcript changed".to_string();
            self.save(&state)?;
            return Ok(Some(state.reason));
        }

        if state.inject_next {
            let reason = if state.reason.is_empty() {
                "forced".to_string()
            } else {
                state.reason.clone()
            };
            state.inject_next = false;
            self.save(&state)?;
            return Ok(Some(reason));
        }

        if state.messages_since_injection >= self.threshold {
            state.messages_since_injection = 0;
            state.reason = format!("{} messages since last injection", self.threshold);
            self.save(&state)?;
            return Ok(Some(state.reason));
        }

        Ok(None)
    }

    /// Record that context was just injected.
    pub fn mark_injected(&self, transcript_path: Option<&str>, reason: &str) -> Result<()> {
        let mut state = self.load()?;
        state.inject_next = false;
        state.messages_since_injection = 0;
        if transcript_path.is_some() {
            state.last_transcript_path = transcript_path.map(String::from);
        }
        state.reason = reason.to_string();
        self.save(&state)
    }

    /// Bump the prompt counter.
    pub fn increment_message_count(&self) -> Result<u32> {
        let mut state = self.load()?;
        state.messages_since_injection += 1;
        self.save(&state)?;
        Ok(state.messages_since_injection)
    }

    /// External trigger: force injection on the next prompt.
    pub fn request_injection(&self, reason: &str) -> Result<()> {
        let mut state = self.load()?;
        state.inject_next = true;
        state.reason = reason.to_string();
        self.save(&state)
    }

    /// Drop all injection state.
    pub fn reset(&self) -> Result<()> {
        self.save(&InjectionState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryStore;

    fn session() -> SessionState {
        SessionState::new(Arc::new(MemoryStore::new()), 5)
    }

    #[test]
    fn test_no_injection_under_threshold() {
        let state = session();
        state.mark_injected(Some("/tmp/t1.jsonl"), "test").unwrap();

        for _ in 0..4 {
            state.increment_message_count().unwrap();
        }
        assert!(state.should_inject(Some("/tmp/t1.jsonl")).unwrap().is_none());
    }

    #[test]
    fn test_injects_exactly_once_at_threshold() {
        let state = session();
        state.mark_injected(Some("/tmp/t1.jsonl"), "test").unwrap();

        for _ in 0..5 {
            state.increment_message_count().unwrap();
        }
        assert!(state.should_inject(Some("/tmp/t1.jsonl")).unwrap().is_some());
        // Counter was reset by the firing decision.
        assert!(state.should_inject(Some("/tmp/t1.jsonl")).unwrap().is_none());
    }

    #[test]
    fn test_transcript_change_triggers_injection() {
        let state = session();
        state.mark_injected(Some("/tmp/t1.jsonl"), "test").unwrap();

        let reason = state.should_inject(Some("/tmp/t2.jsonl")).unwrap();
        assert_eq!(reason.as_deref(), Some("transcript changed"));
        // Path was recorded, so the same path no longer triggers.
        assert!(state.should_inject(Some("/tmp/t2.jsonl")).unwrap().is_none());
    }

    #[test]
    fn test_forced_injection_fires_once() {
        let state = session();
        state.mark_injected(Some("/tmp/t1.jsonl"), "test").unwrap();

        state.request_injection("subagent completed").unwrap();
        let reason = state.should_inject(Some("/tmp/t1.jsonl")).unwrap();
        assert_eq!(reason.as_deref(), Some("subagent completed"));
        assert!(state.should_inject(Some("/tmp/t1.jsonl")).unwrap().is_none());
    }

    #[test]
    fn test_mark_clears_forced_flag() {
        let state = session();
        state.request_injection("compaction").unwrap();
        state.mark_injected(Some("/tmp/t1.jsonl"), "injected").unwrap();
        assert!(state.should_inject(Some("/tmp/t1.jsonl")).unwrap().is_none());
    }

    #[test]
    fn test_first_prompt_with_unknown_transcript_injects() {
        let state = session();
        assert!(state.should_inject(Some("/tmp/fresh.jsonl")).unwrap().is_some());
    }

    #[test]
    fn test_reset() {
        let state = session();
        state.request_injection("anything").unwrap();
        state.reset().unwrap();
        let loaded = state.load().unwrap();
        assert!(!loaded.inject_next);
        assert_eq!(loaded.messages_since_injection, 0);
    }
}
