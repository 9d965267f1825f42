//! Post-edit formatter
//!
//! Runs on PostToolUse after Write/Edit. The formatter is chosen by file
//! extension and located on PATH; a missing or failing formatter is
//! advisory only and never blocks the tool call.

use std::path::Path;
use std::process::Command;

use super::{session_id, tool_file_path, tool_name, HookContext, HookEvent, HookHandler, HookResult};

/// Formatter invocation for one family of file extensions.
struct FormatterSpec {
    extensions: &'static [&'static str],
    /// Candidate binaries in preference order
    commands: &'static [&'static str],
    /// Arguments before the file path
    args: &'static [&'static str],
}

const FORMATTERS: &[FormatterSpec] = &[
    FormatterSpec {
        extensions: &["rs"],
        commands: &["rustfmt"],
        args: &[],
    },
    FormatterSpec {
        extensions: &["py"],
        commands: &["ruff", "black"],
        args: &["format"],
    },
    FormatterSpec {
        extensions: &["js", "jsx", "ts", "tsx", "json", "css", "md", "yaml", "yml"],
        commands: &["prettier"],
        args: &["--write"],
    },
    FormatterSpec {
        extensions: &["go"],
        commands: &["gofmt"],
        args: &["-w"],
    },
];

pub struct FormatHandler {
    enabled: bool,
}

impl FormatHandler {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn format_file(&self, path: &Path, payload: &serde_json::Value, ctx: &HookContext) -> HookResult {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return HookResult::allow();
        };

        let Some(spec) = FORMATTERS.iter().find(|s| s.extensions.contains(&ext)) else {
            return HookResult::allow();
        };

        let Some(binary) = spec.commands.iter().find_map(|c| which::which(c).ok()) else {
            log::debug!("No formatter on PATH for .{} files", ext);
            return HookResult::allow();
        };

        // `ruff format`, `black <file>` - ruff needs its subcommand, black does not
        let args: Vec<&str> = if binary.file_stem().and_then(|s| s.to_str()) == Some("black") {
            vec![]
        } else {
            spec.args.to_vec()
        };

        log::info!("Formatting {} with {}", path.display(), binary.display());
        match Command::new(&binary).args(&args).arg(path).output() {
            Ok(output) if output.status.success() => HookResult::allow(),
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                self.warn_once(ext, &stderr, payload, ctx);
                HookResult::allow()
            }
            Err(e) => {
                self.warn_once(ext, &e.to_string(), payload, ctx);
                HookResult::allow()
            }
        }
    }

    /// A broken formatter would otherwise complain after every edit.
    fn warn_once(&self, ext: &str, detail: &str, payload: &serde_json::Value, ctx: &HookContext) {
        let warning_type = format!("format-failed:{}", ext);
        match ctx.warnings().should_warn(session_id(payload), &warning_type) {
            Ok(true) => {
                eprintln!("warden: formatter for .{} files failed: {}", ext, detail.trim());
                ctx.oplog().emit(HookEvent::PostToolUse, payload, "advisory", Some(&warning_type));
            }
            Ok(false) => {}
            Err(e) => log::warn!("Warning tracker failed: {}", e),
        }
    }
}

impl HookHandler for FormatHandler {
    fn name(&self) -> &'static str {
        "format"
    }

    fn handles(&self, event: HookEvent) -> bool {
        self.enabled && event == HookEvent::PostToolUse
    }

    fn handle(&self, _event: HookEvent, payload: &serde_json::Value, ctx: &HookContext) -> HookResult {
        if !matches!(tool_name(payload), "Write" | "Edit" | "MultiEdit" | "NotebookEdit") {
            return HookResult::allow();
        }

        match tool_file_path(payload) {
            Some(path) if path.exists() => self.format_file(path, payload, ctx),
            _ => HookResult::allow(),
        }
    }
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

    #[test]
    fn test_ignores_non_edit_tools() {
        let handler = FormatHandler::new(true);
        let payload = json!({"session_id": "s1", "tool_name": "Bash", "tool_input": {"command": "ls"}});
        let result = handler.handle(HookEvent::PostToolUse, &payload, &ctx());
        assert!(matches!(result, HookResult::Allow { context: None }));
    }

    #[test]
    fn test_missing_file_is_allowed() {
        let handler = FormatHandler::new(true);
        let payload = json!({
            "session_id": "s1",
            "tool_name": "Write",
            "tool_input": {"file_path": "/definitely/not/here.rs"}
        });
        let result = handler.handle(HookEvent::PostToolUse, &payload, &ctx());
        assert!(matches!(result, HookResult::Allow { .. }));
    }

    #[test]
    fn test_unknown_extension_is_allowed() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("data.xyz");
        std::fs::write(&file, "content").unwrap();

        let handler = FormatHandler::new(true);
        let payload = json!({
            "session_id": "s1",
            "tool_name": "Edit",
            "tool_input": {"file_path": file.to_str().unwrap()}
        });
        let result = handler.handle(HookEvent::PostToolUse, &payload, &ctx());
        assert!(matches!(result, HookResult::Allow { .. }));
    }

    #[test]
    fn test_formatter_table_covers_common_extensions() {
        for ext in ["rs", "py", "ts", "go", "md"] {
            assert!(
                FORMATTERS.iter().any(|s| s.extensions.contains(&ext)),
                "no formatter for .{}",
                ext
            );
        }
    }

    #[test]
    fn test_disabled_handler() {
        let handler = FormatHandler::new(false);
        assert!(!handler.handles(HookEvent::PostToolUse));
    }
}
