//! Session state commands

use colored::*;
use eyre::Result;

use crate::cli::{OutputFormat, SessionAction};
use crate::config::Config;
use crate::hook::HookContext;

pub fn run(action: SessionAction, config: &Config) -> Result<()> {
    let project_root = Config::project_root(None);
    let ctx = HookContext::new(config.clone(), project_root);

    match action {
        SessionAction::Show { format } => show(&ctx, OutputFormat::resolve(format)),
        SessionAction::Reset => reset(&ctx),
        SessionAction::Inject { reason } => inject(&ctx, &reason),
    }
}

fn show(ctx: &HookContext, format: OutputFormat) -> Result<()> {
    let state = ctx.session_state().load()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&state)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&state)?),
        OutputFormat::Text => {
            println!("{}", "Injection state:".bold());
            println!("  inject next:       {}", flag(state.inject_next));
            println!("  messages since:    {}", state.messages_since_injection);
            println!(
                "  last transcript:   {}",
                state.last_transcript_path.as_deref().unwrap_or("(none)")
            );
            println!(
                "  reason:            {}",
                if state.reason.is_empty() { "(none)" } else { state.reason.as_str() }
            );

            let sessions = ctx.warnings().session_count()?;
            println!("  warning sessions:  {}", sessions);
        }
    }

    Ok(())
}

fn reset(ctx: &HookContext) -> Result<()> {
    ctx.session_state().reset()?;
    ctx.warnings().cleanup()?;
    println!("{} Session state cleared", "✓".green());
    Ok(())
}

fn inject(ctx: &HookContext, reason: &str) -> Result<()> {
    ctx.session_state().request_injection(reason)?;
    println!("{} Context will be injected on the next prompt ({})", "✓".green(), reason);
    Ok(())
}

fn flag(value: bool) -> colored::ColoredString {
    if value {
        "yes".yellow()
    } else {
        "no".normal()
    }
}
