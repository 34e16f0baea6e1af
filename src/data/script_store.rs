//! In-memory script storage.

use std::path::Path;

use rustc_hash::FxHashMap;

use super::source::ScriptSource;
use crate::error::HostError;

/// Script contents keyed by path.
///
/// Keys use `/` separators regardless of platform, because that is how the
/// engine spells script names.
#[derive(Clone, Debug, Default)]
pub struct ScriptStore {
    by_name: FxHashMap<String, Vec<u8>>,
}

impl ScriptStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `content` under `name`, replacing any previous content.
    pub fn add(&mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.by_name.insert(name.into(), content.into());
    }

    /// Get a script by its exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.by_name.get(name).map(Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// All stored names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Load every file under `root`, keyed by its path relative to `root`.
    ///
    /// `root/script/c1.lua` is stored as `script/c1.lua`.
    pub fn load_dir(root: impl AsRef<Path>) -> Result<Self, HostError> {
        let mut store = Self::new();
        store.add_dir(root.as_ref(), "")?;
        Ok(store)
    }

    fn add_dir(&mut self, dir: &Path, prefix: &str) -> Result<(), HostError> {
        let entries = std::fs::read_dir(dir).map_err(|e| HostError::io(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| HostError::io(dir, e))?;
            let path = entry.path();
            let name = format!("{prefix}{}", entry.file_name().to_string_lossy());
            let file_type = entry.file_type().map_err(|e| HostError::io(&path, e))?;

            if file_type.is_dir() {
                self.add_dir(&path, &format!("{name}/"))?;
            } else {
                let content = std::fs::read(&path).map_err(|e| HostError::io(&path, e))?;
                self.add(name, content);
            }
        }
        Ok(())
    }
}

impl ScriptSource for ScriptStore {
    fn script(&self, name: &str) -> Option<&[u8]> {
        self.get(name)
    }
}
