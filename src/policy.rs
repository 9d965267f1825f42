//! Path access control
//!
//! Static rule lists loaded from configuration, checked on every file
//! operation. Rules are ordered; the first matching list wins and carries
//! the rejection reason. Anything unmatched is allowed.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::config::PolicyConfig;

/// File operation category, derived from the tool being invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Write,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Read => write!(f, "read"),
            Operation::Write => write!(f, "write"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Outcome of a policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny { reason: String },
}

impl Access {
    pub fn is_denied(&self) -> bool {
        matches!(self, Access::Deny { .. })
    }
}

/// Compiled path policy. Rule paths are expanded and absolutized against the
/// project root at load time.
#[derive(Debug, Clone)]
pub struct PathPolicy {
    project_root: PathBuf,
    no_access: Vec<PathBuf>,
    read_only: Vec<PathBuf>,
    write_restricted: Vec<PathBuf>,
    delete_protected: Vec<PathBuf>,
    protected_files: Vec<String>,
}

impl PathPolicy {
    pub fn from_config(config: &PolicyConfig, project_root: &Path) -> Self {
        let compile = |entries: &[String]| -> Vec<PathBuf> {
            entries.iter().map(|e| normalize(Path::new(e), project_root)).collect()
        };

        Self {
            project_root: project_root.to_path_buf(),
            no_access: compile(&config.no_access),
            read_only: compile(&config.read_only),
            write_restricted: compile(&config.write_restricted),
            delete_protected: compile(&config.delete_protected),
            protected_files: config.protected_files.clone(),
        }
    }

    /// Check a single path against the ordered rule lists.
    ///
    /// Containment means equal-to or nested-under a rule entry. The first
    /// matching list short-circuits with its rejection reason.
    pub fn check(&self, path: &Path, operation: Operation) -> Access {
        let path = normalize(path, &self.project_root);

        if let Some(rule) = contains(&self.no_access, &path) {
            return Access::Deny {
                reason: format!("{} is under no-access path {}", path.display(), rule.display()),
            };
        }

        if operation != Operation::Read {
            if let Some(rule) = contains(&self.read_only, &path) {
                return Access::Deny {
                    reason: format!("{} is under read-only path {}", path.display(), rule.display()),
                };
            }

            if let Some(rule) = contains(&self.write_restricted, &path) {
                return Access::Deny {
                    reason: format!("{} is under write-restricted path {}", path.display(), rule.display()),
                };
            }
        }

        if operation == Operation::Delete {
            if let Some(rule) = contains(&self.delete_protected, &path) {
                return Access::Deny {
                    reason: format!("{} is under delete-protected path {}", path.display(), rule.display()),
                };
            }
        }

        if operation != Operation::Read {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if self.protected_files.iter().any(|p| p == name) {
                    return Access::Deny {
                        reason: format!("{} is a protected file", name),
                    };
                }
            }
        }

        Access::Allow
    }

    /// Rule lists for display, in check order.
    pub fn rule_lists(&self) -> Vec<(&'static str, Vec<String>)> {
        let show = |paths: &[PathBuf]| paths.iter().map(|p| p.display().to_string()).collect();
        vec![
            ("no-access", show(&self.no_access)),
            ("read-only", show(&self.read_only)),
            ("write-restricted", show(&self.write_restricted)),
            ("delete-protected", show(&self.delete_protected)),
            ("protected-files", self.protected_files.clone()),
        ]
    }
}

fn contains<'a>(rules: &'a [PathBuf], path: &Path) -> Option<&'a PathBuf> {
    rules.iter().find(|rule| path == rule.as_path() || path.starts_with(rule))
}

/// Normalize a path to absolute form: expand `~` and env vars, join relative
/// paths onto the project root, and collapse `.`/`..` lexically (no symlink
/// resolution, the target may not exist yet).
pub fn normalize(path: &Path, project_root: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw).map(|s| s.into_owned()).unwrap_or_else(|_| raw.into_owned());
    let expanded = PathBuf::from(expanded);

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        project_root.join(expanded)
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PathPolicy {
        PathPolicy::from_config(
            &PolicyConfig {
                no_access: vec!["/etc/secrets".to_string(), "vault".to_string()],
                read_only: vec!["/usr/lib".to_string()],
                write_restricted: vec!["config".to_string()],
                delete_protected: vec!["src".to_string()],
                protected_files: vec![".env".to_string(), "Cargo.lock".to_string()],
            },
            Path::new("/project"),
        )
    }

    #[test]
    fn test_no_access_denies_both_operations() {
        let policy = policy();
        assert!(policy.check(Path::new("/etc/secrets"), Operation::Read).is_denied());
        assert!(policy.check(Path::new("/etc/secrets"), Operation::Write).is_denied());
        assert!(policy.check(Path::new("/etc/secrets/api.key"), Operation::Read).is_denied());
        assert!(policy.check(Path::new("/etc/secrets/deep/nested"), Operation::Write).is_denied());
    }

    #[test]
    fn test_relative_rule_resolves_against_project_root() {
        let policy = policy();
        assert!(policy.check(Path::new("vault/keys.json"), Operation::Read).is_denied());
        assert!(policy.check(Path::new("/project/vault"), Operation::Read).is_denied());
    }

    #[test]
    fn test_read_only_allows_reads() {
        let policy = policy();
        assert_eq!(policy.check(Path::new("/usr/lib/libfoo.so"), Operation::Read), Access::Allow);
        assert!(policy.check(Path::new("/usr/lib/libfoo.so"), Operation::Write).is_denied());
        assert!(policy.check(Path::new("/usr/lib/libfoo.so"), Operation::Delete).is_denied());
    }

    #[test]
    fn test_write_restricted() {
        let policy = policy();
        assert_eq!(policy.check(Path::new("config/app.yaml"), Operation::Read), Access::Allow);
        assert!(policy.check(Path::new("config/app.yaml"), Operation::Write).is_denied());
    }

    #[test]
    fn test_delete_protected_allows_writes() {
        let policy = policy();
        assert_eq!(policy.check(Path::new("src/main.rs"), Operation::Write), Access::Allow);
        assert!(policy.check(Path::new("src/main.rs"), Operation::Delete).is_denied());
    }

    #[test]
    fn test_protected_files_by_name() {
        let policy = policy();
        assert!(policy.check(Path::new("/project/sub/.env"), Operation::Write).is_denied());
        assert!(policy.check(Path::new("Cargo.lock"), Operation::Delete).is_denied());
        assert_eq!(policy.check(Path::new("/project/sub/.env"), Operation::Read), Access::Allow);
    }

    #[test]
    fn test_default_allow() {
        let policy = policy();
        assert_eq!(policy.check(Path::new("README.md"), Operation::Write), Access::Allow);
    }

    #[test]
    fn test_sibling_prefix_is_not_containment() {
        let policy = policy();
        // "/etc/secrets-old" shares a string prefix but is not nested.
        assert_eq!(policy.check(Path::new("/etc/secrets-old/x"), Operation::Read), Access::Allow);
    }

    #[test]
    fn test_normalize_collapses_dots() {
        let root = Path::new("/project");
        assert_eq!(normalize(Path::new("a/./b/../c"), root), PathBuf::from("/project/a/c"));
        assert_eq!(normalize(Path::new("/etc/secrets/../secrets/key"), root), PathBuf::from("/etc/secrets/key"));
    }

    #[test]
    fn test_dotdot_escape_still_checked() {
        let policy = policy();
        // Escaping into a no-access dir via .. is caught after normalization.
        assert!(policy.check(Path::new("/project/../etc/secrets/key"), Operation::Read).is_denied());
    }
}
