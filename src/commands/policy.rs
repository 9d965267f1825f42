//! Policy inspection commands

use colored::*;
use eyre::Result;
use std::path::PathBuf;

use crate::cli::PolicyAction;
use crate::config::Config;
use crate::policy::{Access, Operation, PathPolicy};

pub fn run(action: PolicyAction, config: &Config) -> Result<()> {
    let project_root = Config::project_root(None);
    let policy = PathPolicy::from_config(&config.policy, &project_root);

    match action {
        PolicyAction::Check { path, operation } => check(&policy, &path, operation),
        PolicyAction::Show => show(&policy),
    }
}

fn check(policy: &PathPolicy, path: &PathBuf, operation: Operation) -> Result<()> {
    match policy.check(path, operation) {
        Access::Allow => {
            println!("{} {} {} is allowed", "✓".green(), operation, path.display());
        }
        Access::Deny { reason } => {
            println!("{} {} {} is denied: {}", "✗".red(), operation, path.display(), reason);
            // Same exit code the hook uses, so scripts can branch on it
            std::process::exit(crate::commands::hook::EXIT_BLOCK);
        }
    }
    Ok(())
}

fn show(policy: &PathPolicy) -> Result<()> {
    println!("{}", "Path policy (checked in order):".bold());
    println!();

    for (list_name, entries) in policy.rule_lists() {
        println!("  {}", list_name.cyan());
        if entries.is_empty() {
            println!("    {}", "(empty)".dimmed());
        }
        for entry in entries {
            println!("    {}", entry);
        }
        println!();
    }

    Ok(())
}
