//! JSON-backed session state
//!
//! All per-project state lives under `<project_root>/.warden/` as one JSON
//! file per concern. Handlers never touch the filesystem directly; they go
//! through the [`StateStore`] trait so tests can swap in a memory store.

#![allow(dead_code)] // MemoryStore and force_warn are test seams

use eyre::{Context, Result};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Mutex;

pub mod injection;
pub mod warnings;

pub use injection::{InjectionState, SessionState};
pub use warnings::WarningTracker;

/// Name of the dotfile directory under the project root.
pub const STATE_DIR: &str = ".warden";

/// Key-value store for JSON state documents.
///
/// Documents are read-then-write with no cross-process locking; a concurrent
/// external invocation can race and the last writer wins. One hook fires per
/// assistant event, so this is accepted.
pub trait StateStore: Send + Sync {
    /// Read a whole document, `None` if it does not exist yet.
    fn read_doc(&self, name: &str) -> Result<Option<serde_json::Value>>;

    /// Replace a whole document.
    fn write_doc(&self, name: &str, value: &serde_json::Value) -> Result<()>;

    /// Append one JSON value as a line (JSON-lines documents).
    fn append_line(&self, name: &str, value: &serde_json::Value) -> Result<()>;

    /// Read all lines of a JSON-lines document. Unparseable lines are skipped.
    fn read_lines(&self, name: &str) -> Result<Vec<serde_json::Value>>;
}

/// File-backed store rooted at the project's `.warden/` directory.
///
/// Keeps an in-process cache behind a mutex so repeated reads within one hook
/// invocation hit the disk once.
pub struct JsonFileStore {
    dir: PathBuf,
    cache: Mutex<HashMap<String, serde_json::Value>>,
}

impl JsonFileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Store rooted at `<project_root>/.warden`.
    pub fn for_project(project_root: &std::path::Path) -> Self {
        Self::new(project_root.join(STATE_DIR))
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .context(format!("Failed to create state directory {}", self.dir.display()))
    }
}

impl StateStore for JsonFileStore {
    fn read_doc(&self, name: &str) -> Result<Option<serde_json::Value>> {
        if let Some(cached) = self.cache.lock().unwrap().get(name) {
            return Ok(Some(cached.clone()));
        }

        let path = self.path_for(name);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).context(format!("Failed to read {}", path.display()))?;
        let value: serde_json::Value =
            serde_json::from_str(&content).context(format!("Failed to parse {}", path.display()))?;

        self.cache.lock().unwrap().insert(name.to_string(), value.clone());
        Ok(Some(value))
    }

    fn write_doc(&self, name: &str, value: &serde_json::Value) -> Result<()> {
        self.ensure_dir()?;

        let path = self.path_for(name);
        let content = serde_json::to_string_pretty(value).context("Failed to serialize state document")?;
        fs::write(&path, content).context(format!("Failed to write {}", path.display()))?;

        self.cache.lock().unwrap().insert(name.to_string(), value.clone());
        Ok(())
    }

    fn append_line(&self, name: &str, value: &serde_json::Value) -> Result<()> {
        self.ensure_dir()?;

        let path = self.path_for(name);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context(format!("Failed to open {}", path.display()))?;

        let json = serde_json::to_string(value).context("Failed to serialize log record")?;
        writeln!(file, "{}", json).context("Failed to append log record")?;
        Ok(())
    }

    fn read_lines(&self, name: &str) -> Result<Vec<serde_json::Value>> {
        let path = self.path_for(name);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).context(format!("Failed to read {}", path.display()))?;
        Ok(content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect())
    }
}

/// In-memory store for tests.
pub struct MemoryStore {
    docs: Mutex<HashMap<String, serde_json::Value>>,
    lines: Mutex<HashMap<String, Vec<serde_json::Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            docs: Mutex::new(HashMap::new()),
            lines: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for MemoryStore {
    fn read_doc(&self, name: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.docs.lock().unwrap().get(name).cloned())
    }

    fn write_doc(&self, name: &str, value: &serde_json::Value) -> Result<()> {
        self.docs.lock().unwrap().insert(name.to_string(), value.clone());
        Ok(())
    }

    fn append_line(&self, name: &str, value: &serde_json::Value) -> Result<()> {
        self.lines
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .push(value.clone());
        Ok(())
    }

    fn read_lines(&self, name: &str) -> Result<Vec<serde_json::Value>> {
        Ok(self.lines.lock().unwrap().get(name).cloned().unwrap_or_default())
    }
}
