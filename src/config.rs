use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main warden configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub log_level: LogLevel,
    pub hooks: HooksConfig,
    pub policy: PolicyConfig,
    pub injection: InjectionConfig,
    pub oplog: OplogConfig,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Off => log::LevelFilter::Off,
        }
    }
}

/// Per-feature enable switches for the hook handlers
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HooksConfig {
    pub guard_enabled: bool,
    pub inject_enabled: bool,
    pub format_enabled: bool,
    pub session_enabled: bool,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            guard_enabled: true,
            inject_enabled: true,
            format_enabled: true,
            session_enabled: true,
        }
    }
}

/// Path access rule lists, checked in declaration order.
/// Entries may be absolute, relative to the project root, or contain `~`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub no_access: Vec<String>,
    pub read_only: Vec<String>,
    pub write_restricted: Vec<String>,
    pub delete_protected: Vec<String>,
    pub protected_files: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            no_access: vec!["~/.ssh".to_string(), "~/.aws".to_string(), "~/.gnupg".to_string()],
            read_only: vec![],
            write_restricted: vec![".git".to_string()],
            delete_protected: vec![],
            protected_files: vec![
                ".env".to_string(),
                "Cargo.lock".to_string(),
                "package-lock.json".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InjectionConfig {
    /// Prompts between automatic re-injections
    pub message_threshold: u32,
    /// Project file whose contents are injected (relative to project root)
    pub context_file: Option<PathBuf>,
}

impl Default for InjectionConfig {
    fn default() -> Self {
        Self {
            message_threshold: 5,
            context_file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OplogConfig {
    pub enabled: bool,
    /// Include the raw event payload in each record (can be verbose)
    pub include_payload: bool,
}

impl Default for OplogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            include_payload: false,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain, then apply env overrides
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file_chain(config_path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_file_chain(config_path: Option<&PathBuf>) -> Result<Self> {
        // Explicit config path must load or the command fails
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Check WARDEN_CONFIG env var
        if let Ok(env_path) = std::env::var("WARDEN_CONFIG") {
            let path = PathBuf::from(env_path);
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from WARDEN_CONFIG: {}", e);
                    }
                }
            }
        }

        // Try WARDEN_DIR/warden.yaml
        if let Ok(warden_dir) = std::env::var("WARDEN_DIR") {
            let path = PathBuf::from(warden_dir).join("warden.yaml");
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from WARDEN_DIR: {}", e);
                    }
                }
            }
        }

        // Try ~/.config/warden/warden.yaml
        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("warden").join("warden.yaml");
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", path.display(), e);
                    }
                }
            }
        }

        // Try ./warden.yaml (for development)
        let local_config = PathBuf::from("warden.yaml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load local config: {}", e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Per-feature kill switches and the debug flag come from the environment
    /// so individual hooks can be disabled without editing the config file.
    fn apply_env_overrides(&mut self) {
        if env_flag("WARDEN_DISABLE_GUARD") {
            self.hooks.guard_enabled = false;
        }
        if env_flag("WARDEN_DISABLE_INJECT") {
            self.hooks.inject_enabled = false;
        }
        if env_flag("WARDEN_DISABLE_FORMAT") {
            self.hooks.format_enabled = false;
        }
        if env_flag("WARDEN_DISABLE_SESSION") {
            self.hooks.session_enabled = false;
        }
        if env_flag("WARDEN_DEBUG") {
            self.log_level = LogLevel::Debug;
        }
    }

    /// Get the warden directory (config home)
    pub fn warden_dir() -> PathBuf {
        std::env::var("WARDEN_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("warden"))
    }

    /// Resolve the project root: WARDEN_PROJECT_ROOT env, else the payload's
    /// `cwd`, else the process working directory.
    pub fn project_root(payload_cwd: Option<&str>) -> PathBuf {
        if let Ok(root) = std::env::var("WARDEN_PROJECT_ROOT") {
            return PathBuf::from(root);
        }
        if let Some(cwd) = payload_cwd {
            return PathBuf::from(cwd);
        }
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    /// Expand a path that may contain ~ or env vars
    pub fn expand_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        let expanded = shellexpand::full(&path_str).unwrap_or_else(|_| path_str.clone());
        PathBuf::from(expanded.as_ref())
    }
}

fn env_flag(name: &str) -> bool {
    matches!(std::env::var(name).as_deref(), Ok("1") | Ok("true") | Ok("yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.hooks.guard_enabled);
        assert!(config.hooks.inject_enabled);
        assert_eq!(config.injection.message_threshold, 5);
        assert!(config.oplog.enabled);
    }

    #[test]
    fn test_default_policy_protects_env_files() {
        let config = PolicyConfig::default();
        assert!(config.protected_files.contains(&".env".to_string()));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = Config::default();
        let yaml_str = serde_yaml::to_string(&config).expect("Failed to serialize");
        let parsed: Config = serde_yaml::from_str(&yaml_str).expect("Failed to deserialize");
        assert_eq!(parsed.hooks.guard_enabled, config.hooks.guard_enabled);
        assert_eq!(parsed.injection.message_threshold, config.injection.message_threshold);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let yaml = "hooks:\n  format_enabled: false\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.hooks.format_enabled);
        assert!(config.hooks.guard_enabled);
        assert_eq!(config.injection.message_threshold, 5);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test");
        let expanded = Config::expand_path(&path);
        assert!(!expanded.to_string_lossy().contains('~'));
        assert!(expanded.to_string_lossy().contains("test"));
    }

    #[test]
    fn test_project_root_from_payload_cwd() {
        // SAFETY: Test runs single-threaded, env var is test-specific
        unsafe {
            std::env::remove_var("WARDEN_PROJECT_ROOT");
        }
        let root = Config::project_root(Some("/work/project"));
        assert_eq!(root, PathBuf::from("/work/project"));
    }

    #[test]
    fn test_project_root_env_wins() {
        // SAFETY: Test runs single-threaded, env var is test-specific
        unsafe {
            std::env::set_var("WARDEN_PROJECT_ROOT", "/forced/root");
        }
        let root = Config::project_root(Some("/work/project"));
        assert_eq!(root, PathBuf::from("/forced/root"));
        unsafe {
            std::env::remove_var("WARDEN_PROJECT_ROOT");
        }
    }

    #[test]
    fn test_load_returns_config() {
        let result = Config::load(None);
        assert!(result.is_ok());
    }
}
