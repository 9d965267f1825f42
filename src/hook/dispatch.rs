//! Hook event dispatching

use super::{HookContext, HookEvent, HookHandler, HookResult};

/// Dispatch a hook event to all registered handlers.
///
/// The first Block short-circuits. Errors are logged and skipped (fail open).
/// Context strings from multiple allowing handlers are concatenated.
pub fn dispatch(
    event: HookEvent,
    payload: &serde_json::Value,
    handlers: &[Box<dyn HookHandler>],
    ctx: &HookContext,
) -> HookResult {
    let mut contexts: Vec<String> = Vec::new();

    for handler in handlers {
        if !handler.handles(event) {
            continue;
        }

        match handler.handle(event, payload, ctx) {
            HookResult::Block { message } => {
                log::info!("Hook {} blocked: {}", handler.name(), message);
                return HookResult::Block { message };
            }
            HookResult::Error { message } => {
                log::error!("Hook {} error: {}", handler.name(), message);
                eprintln!("warden: {}: {}", handler.name(), message);
                // Continue to next handler
            }
            HookResult::Allow { context } => {
                if let Some(context) = context {
                    contexts.push(context);
                }
            }
        }
    }

    if contexts.is_empty() {
        HookResult::allow()
    } else {
        HookResult::allow_with_context(contexts.join("\n\n"))
    }
}
