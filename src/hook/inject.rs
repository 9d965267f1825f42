//! Context injection
//!
//! Decides on every user prompt whether the project context block should be
//! re-injected into the conversation, and always injects at session start.

use std::fs;

use super::{transcript_path, HookContext, HookEvent, HookHandler, HookResult};

pub struct InjectHandler {
    enabled: bool,
}

impl InjectHandler {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn on_user_prompt_submit(&self, payload: &serde_json::Value, ctx: &HookContext) -> HookResult {
        let state = ctx.session_state();
        let transcript = transcript_path(payload);

        if let Err(e) = state.increment_message_count() {
            return HookResult::Error {
                message: format!("Failed to update message count: {}", e),
            };
        }

        match state.should_inject(transcript) {
            Ok(Some(reason)) => {
                log::info!("Injecting context: {}", reason);
                let context = render_context(&reason, ctx);
                if let Err(e) = state.mark_injected(transcript, &reason) {
                    log::error!("Failed to mark injection: {}", e);
                }
                HookResult::allow_with_context(context)
            }
            Ok(None) => HookResult::allow(),
            Err(e) => HookResult::Error {
                message: format!("Injection decision failed: {}", e),
            },
        }
    }

    fn on_session_start(&self, payload: &serde_json::Value, ctx: &HookContext) -> HookResult {
        // Fresh conversation always gets the context block
        let reason = "session started";
        let context = render_context(reason, ctx);

        let state = ctx.session_state();
        if let Err(e) = state.mark_injected(transcript_path(payload), reason) {
            log::error!("Failed to mark injection: {}", e);
        }

        HookResult::allow_with_context(context)
    }
}

impl HookHandler for InjectHandler {
    fn name(&self) -> &'static str {
        "inject"
    }

    fn handles(&self, event: HookEvent) -> bool {
        self.enabled && matches!(event, HookEvent::UserPromptSubmit | HookEvent::SessionStart)
    }

    fn handle(&self, event: HookEvent, payload: &serde_json::Value, ctx: &HookContext) -> HookResult {
        match event {
            HookEvent::UserPromptSubmit => self.on_user_prompt_submit(payload, ctx),
            HookEvent::SessionStart => self.on_session_start(payload, ctx),
            _ => HookResult::allow(),
        }
    }
}

/// Build the context block: the configured project context file when present,
/// otherwise a short built-in reminder.
fn render_context(reason: &str, ctx: &HookContext) -> String {
    if let Some(ref file) = ctx.config.injection.context_file {
        let path = if file.is_absolute() {
            file.clone()
        } else {
            ctx.project_root.join(file)
        };

        match fs::read_to_string(&path) {
            Ok(content) => {
                return format!("<project-context reason=\"{}\">\n{}\n</project-context>", reason, content.trim());
            }
            Err(e) => {
                log::warn!("Failed to read context file {}: {}", path.display(), e);
            }
        }
    }

    format!(
        "<project-context reason=\"{}\">\nProject root: {}\nRe-read the project conventions before continuing.\n</project-context>",
        reason,
        ctx.project_root.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::state::MemoryStore;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn ctx() -> HookContext {
        HookContext::with_store(Config::default(), PathBuf::from("/project"), Arc::new(MemoryStore::new()))
    }

    fn prompt_payload() -> serde_json::Value {
        json!({
            "session_id": "s1",
            "transcript_path": "/tmp/transcript.jsonl",
            "prompt": "do the thing"
        })
    }

    #[test]
    fn test_session_start_always_injects() {
        let handler = InjectHandler::new(true);
        let result = handler.handle(HookEvent::SessionStart, &prompt_payload(), &ctx());
        match result {
            HookResult::Allow { context: Some(c) } => assert!(c.contains("session started")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_prompts_under_threshold_stay_quiet() {
        let handler = InjectHandler::new(true);
        let ctx = ctx();
        let payload = prompt_payload();

        // SessionStart marks; the next four prompts must not inject.
        handler.handle(HookEvent::SessionStart, &payload, &ctx);
        for _ in 0..4 {
            let result = handler.handle(HookEvent::UserPromptSubmit, &payload, &ctx);
            assert!(matches!(result, HookResult::Allow { context: None }));
        }
    }

    #[test]
    fn test_fifth_prompt_reinjects() {
        let handler = InjectHandler::new(true);
        let ctx = ctx();
        let payload = prompt_payload();

        handler.handle(HookEvent::SessionStart, &payload, &ctx);
        for _ in 0..4 {
            handler.handle(HookEvent::UserPromptSubmit, &payload, &ctx);
        }
        let result = handler.handle(HookEvent::UserPromptSubmit, &payload, &ctx);
        assert!(matches!(result, HookResult::Allow { context: Some(_) }));

        // And the one after is quiet again.
        let result = handler.handle(HookEvent::UserPromptSubmit, &payload, &ctx);
        assert!(matches!(result, HookResult::Allow { context: None }));
    }

    #[test]
    fn test_forced_injection_applies_on_next_prompt() {
        let handler = InjectHandler::new(true);
        let ctx = ctx();
        let payload = prompt_payload();

        handler.handle(HookEvent::SessionStart, &payload, &ctx);
        ctx.session_state().request_injection("subagent completed").unwrap();

        let result = handler.handle(HookEvent::UserPromptSubmit, &payload, &ctx);
        match result {
            HookResult::Allow { context: Some(c) } => assert!(c.contains("subagent completed")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_transcript_change_reinjects() {
        let handler = InjectHandler::new(true);
        let ctx = ctx();

        handler.handle(HookEvent::SessionStart, &prompt_payload(), &ctx);

        let changed = json!({
            "session_id": "s2",
            "transcript_path": "/tmp/other.jsonl",
            "prompt": "hi"
        });
        let result = handler.handle(HookEvent::UserPromptSubmit, &changed, &ctx);
        assert!(matches!(result, HookResult::Allow { context: Some(_) }));
    }

    #[test]
    fn test_context_file_contents_used() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("CONTEXT.md"), "Always run the linter.").unwrap();

        let config = Config {
            injection: crate::config::InjectionConfig {
                message_threshold: 5,
                context_file: Some(PathBuf::from("CONTEXT.md")),
            },
            ..Config::default()
        };
        let ctx = HookContext::with_store(config, dir.path().to_path_buf(), Arc::new(MemoryStore::new()));

        let handler = InjectHandler::new(true);
        let result = handler.handle(HookEvent::SessionStart, &prompt_payload(), &ctx);
        match result {
            HookResult::Allow { context: Some(c) } => assert!(c.contains("Always run the linter.")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_disabled_handler() {
        let handler = InjectHandler::new(false);
        assert!(!handler.handles(HookEvent::UserPromptSubmit));
    }
}
