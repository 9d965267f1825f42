//! Session lifecycle handler
//!
//! Turns lifecycle events into injection triggers and state cleanup:
//! subagent completion and context compaction both mean the conversation
//! lost context, so the next prompt re-injects.

use super::{session_id, HookContext, HookEvent, HookHandler, HookResult};

pub struct LifecycleHandler {
    enabled: bool,
}

impl LifecycleHandler {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn request_injection(&self, reason: &str, ctx: &HookContext) -> HookResult {
        match ctx.session_state().request_injection(reason) {
            Ok(()) => {
                log::info!("Injection requested: {}", reason);
                HookResult::allow()
            }
            Err(e) => HookResult::Error {
                message: format!("Failed to request injection: {}", e),
            },
        }
    }

    fn on_session_end(&self, payload: &serde_json::Value, ctx: &HookContext) -> HookResult {
        let sid = session_id(payload);
        log::info!("Session ended: {}", &sid[..8.min(sid.len())]);

        match ctx.warnings().cleanup() {
            Ok(removed) if removed > 0 => {
                log::info!("Dropped {} stale warning session(s)", removed);
            }
            Ok(_) => {}
            Err(e) => log::warn!("Warning cleanup failed: {}", e),
        }

        HookResult::allow()
    }
}

impl HookHandler for LifecycleHandler {
    fn name(&self) -> &'static str {
        "session"
    }

    fn handles(&self, event: HookEvent) -> bool {
        self.enabled
            && matches!(
                event,
                HookEvent::Stop | HookEvent::SubagentStop | HookEvent::PreCompact | HookEvent::SessionEnd
            )
    }

    fn handle(&self, event: HookEvent, payload: &serde_json::Value, ctx: &HookContext) -> HookResult {
        match event {
            HookEvent::SubagentStop => self.request_injection("subagent completed", ctx),
            HookEvent::PreCompact => self.request_injection("context compacted", ctx),
            HookEvent::SessionEnd => self.on_session_end(payload, ctx),
            // Stop is logged centrally; nothing to do here
            _ => HookResult::allow(),
        }
    }
}
