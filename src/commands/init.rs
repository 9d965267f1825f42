//! Initialize warden configuration

use colored::*;
use eyre::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::config::Config;

/// Hook settings block to paste into Claude Code's settings.json.
const HOOK_SETTINGS_SNIPPET: &str = r#"{
  "hooks": {
    "PreToolUse": [{"hooks": [{"type": "command", "command": "warden hook dispatch pre-tool-use"}]}],
    "PostToolUse": [{"hooks": [{"type": "command", "command": "warden hook dispatch post-tool-use"}]}],
    "UserPromptSubmit": [{"hooks": [{"type": "command", "command": "warden hook dispatch user-prompt-submit"}]}],
    "SessionStart": [{"hooks": [{"type": "command", "command": "warden hook dispatch session-start"}]}],
    "SessionEnd": [{"hooks": [{"type": "command", "command": "warden hook dispatch session-end"}]}],
    "SubagentStop": [{"hooks": [{"type": "command", "command": "warden hook dispatch subagent-stop"}]}],
    "PreCompact": [{"hooks": [{"type": "command", "command": "warden hook dispatch pre-compact"}]}]
  }
}"#;

pub fn run(path: Option<PathBuf>, force: bool) -> Result<()> {
    let target_dir = path.unwrap_or_else(Config::warden_dir);
    let config_path = target_dir.join("warden.yaml");

    if config_path.exists() && !force {
        eprintln!(
            "{} {} already exists (use --force to overwrite)",
            "✗".red(),
            config_path.display()
        );
        return Ok(());
    }

    fs::create_dir_all(&target_dir).context(format!("Failed to create {}", target_dir.display()))?;

    let config = Config::default();
    let yaml = serde_yaml::to_string(&config).context("Failed to serialize default config")?;
    fs::write(&config_path, yaml).context(format!("Failed to write {}", config_path.display()))?;

    println!("{} Wrote {}", "✓".green(), config_path.display());
    println!();
    println!("{}", "Add to Claude Code settings.json:".bold());
    println!("{}", HOOK_SETTINGS_SNIPPET.dimmed());

    Ok(())
}
