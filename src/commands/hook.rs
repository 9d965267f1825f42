//! Hook dispatch entry point
//!
//! This is what Claude Code actually invokes: payload on stdin, context on
//! stdout, outcome in the exit code.

use colored::*;
use eyre::{Context, Result};
use std::io::{self, Read};

use crate::cli::HookAction;
use crate::config::Config;
use crate::hook::{self, dispatch, HookContext, HookEvent, HookResult};

/// Exit codes for hook dispatch
/// These match Claude Code's expectations
pub const EXIT_ALLOW: i32 = 0;
pub const EXIT_BLOCK: i32 = 2;

pub fn run(action: HookAction, config: &Config) -> Result<()> {
    match action {
        HookAction::Dispatch { event, payload } => dispatch_event(&event, payload.as_deref(), config),
        HookAction::List { event } => list(event.as_deref(), config),
    }
}

fn dispatch_event(event: &str, payload: Option<&str>, config: &Config) -> Result<()> {
    // Catch everything: a broken hook must never wedge the assistant.
    // Only deliberate policy blocks exit non-zero.
    let exit_code = match try_dispatch(event, payload, config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("warden: hook error: {:#}", e);
            EXIT_ALLOW
        }
    };

    std::process::exit(exit_code);
}

fn try_dispatch(event_str: &str, payload: Option<&str>, config: &Config) -> Result<i32> {
    // Read payload from stdin if not provided
    let payload_str = match payload {
        Some(p) => p.to_string(),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read payload from stdin")?;
            buffer
        }
    };

    let payload: serde_json::Value = serde_json::from_str(&payload_str).context("Failed to parse payload JSON")?;

    let Some(event) = HookEvent::parse(event_str) else {
        eprintln!("warden: unknown hook event: {}", event_str);
        return Ok(EXIT_ALLOW);
    };

    log::info!("Dispatching hook event: {:?}", event);
    log::debug!("Payload: {}", payload);

    let project_root = Config::project_root(hook::payload_str(&payload, "cwd", "cwd"));
    let ctx = HookContext::new(config.clone(), project_root);
    let handlers = hook::registered_handlers(config);

    let result = dispatch::dispatch(event, &payload, &handlers, &ctx);

    match &result {
        HookResult::Block { message } => {
            ctx.oplog().emit(event, &payload, "block", Some(message));
            // Blocking feedback goes to stderr so Claude Code relays it
            eprintln!("{}", message);
        }
        HookResult::Allow { context } => {
            ctx.oplog().emit(event, &payload, "allow", None);
            if let Some(context) = context {
                emit_context(event, context);
            }
        }
        HookResult::Error { message } => {
            ctx.oplog().emit(event, &payload, "error", Some(message));
        }
    }

    Ok(result.exit_code())
}

/// Write handler context to stdout in the shape Claude Code expects for the
/// event: a hookSpecificOutput JSON object where supported, plain text
/// otherwise.
fn emit_context(event: HookEvent, context: &str) {
    if event.supports_context_output() {
        let output = serde_json::json!({
            "hookSpecificOutput": {
                "hookEventName": format!("{:?}", event),
                "additionalContext": context,
            }
        });
        println!("{}", output);
    } else {
        println!("{}", context);
    }
}

fn list(event_filter: Option<&str>, config: &Config) -> Result<()> {
    let handlers = hook::registered_handlers(config);

    let events: Vec<HookEvent> = match event_filter {
        Some(s) => match HookEvent::parse(s) {
            Some(event) => vec![event],
            None => {
                eprintln!("Unknown event: {}", s);
                return Ok(());
            }
        },
        None => HookEvent::all().to_vec(),
    };

    println!("{}", "Registered hook handlers:".bold());
    println!();

    for event in events {
        let names: Vec<&str> = handlers.iter().filter(|h| h.handles(event)).map(|h| h.name()).collect();

        let listing = if names.is_empty() {
            "(none)".dimmed().to_string()
        } else {
            names.join(", ").cyan().to_string()
        };
        println!("  {:<18} {}", format!("{:?}", event), listing);
    }

    Ok(())
}
