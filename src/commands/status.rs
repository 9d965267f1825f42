//! System status command
//!
//! Shows the project's state files and handler configuration at a glance.

use colored::*;
use eyre::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::hook::{self, HookContext, HookEvent};
use crate::state::STATE_DIR;

#[derive(Serialize)]
struct Status {
    version: String,
    project_root: String,
    state_dir: String,
    state_dir_exists: bool,
    hooks: HookStatus,
    injection: InjectionStatus,
    warning_sessions: usize,
    operations_logged: usize,
}

#[derive(Serialize)]
struct HookStatus {
    guard_enabled: bool,
    inject_enabled: bool,
    format_enabled: bool,
    session_enabled: bool,
}

#[derive(Serialize)]
struct InjectionStatus {
    inject_next: bool,
    messages_since_injection: u32,
    message_threshold: u32,
}

pub fn run(format: OutputFormat, config: &Config) -> Result<()> {
    let project_root = Config::project_root(None);
    let ctx = HookContext::new(config.clone(), project_root.clone());

    let injection_state = ctx.session_state().load()?;
    let state_dir: PathBuf = project_root.join(STATE_DIR);

    let status = Status {
        version: env!("GIT_DESCRIBE").to_string(),
        project_root: project_root.display().to_string(),
        state_dir: state_dir.display().to_string(),
        state_dir_exists: state_dir.exists(),
        hooks: HookStatus {
            guard_enabled: config.hooks.guard_enabled,
            inject_enabled: config.hooks.inject_enabled,
            format_enabled: config.hooks.format_enabled,
            session_enabled: config.hooks.session_enabled,
        },
        injection: InjectionStatus {
            inject_next: injection_state.inject_next,
            messages_since_injection: injection_state.messages_since_injection,
            message_threshold: config.injection.message_threshold,
        },
        warning_sessions: ctx.warnings().session_count()?,
        operations_logged: ctx.oplog().records()?.len(),
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&status)?),
        OutputFormat::Text => print_text(&status, config),
    }

    Ok(())
}

fn print_text(status: &Status, config: &Config) {
    println!("{} {}", "warden".bold(), status.version);
    println!();
    println!("  project root:  {}", status.project_root);
    println!(
        "  state dir:     {} {}",
        status.state_dir,
        if status.state_dir_exists {
            "".normal()
        } else {
            "(not created yet)".dimmed()
        }
    );
    println!();

    println!("{}", "Handlers:".bold());
    for (name, enabled) in [
        ("guard", status.hooks.guard_enabled),
        ("inject", status.hooks.inject_enabled),
        ("format", status.hooks.format_enabled),
        ("session", status.hooks.session_enabled),
    ] {
        let marker = if enabled { "✓".green() } else { "✗".red() };
        println!("  {} {}", marker, name);
    }
    println!();

    println!("{}", "Injection:".bold());
    println!(
        "  {} of {} messages until re-injection{}",
        status.injection.messages_since_injection,
        status.injection.message_threshold,
        if status.injection.inject_next {
            " (forced on next prompt)".yellow().to_string()
        } else {
            String::new()
        }
    );
    println!();

    println!("  warning sessions:  {}", status.warning_sessions);
    println!("  operations logged: {}", status.operations_logged);

    let handlers = hook::registered_handlers(config);
    let active: usize = HookEvent::all()
        .iter()
        .filter(|e| handlers.iter().any(|h| h.handles(**e)))
        .count();
    println!("  events covered:    {}/{}", active, HookEvent::all().len());
}
