// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Small persistent client preferences (chosen color, timestamp toggle).
//!
//! Values live until explicitly deleted; there is no expiry.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ClientError;

/// Preference key for the user's chat color.
pub const COLOR_KEY: &str = "color";
/// Preference key for the timestamp toggle (`"true"` / `"false"`).
pub const TIMESTAMP_KEY: &str = "timestamp";

/// Get/set/delete of small string values keyed by name.
pub trait PreferenceStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), ClientError>;
    fn delete(&mut self, key: &str) -> Result<(), ClientError>;
}

/// Process-lifetime preferences; nothing survives a restart.
#[derive(Debug, Default, Clone)]
pub struct MemoryPrefs {
    values: BTreeMap<String, String>,
}

impl MemoryPrefs {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPrefs {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ClientError> {
        self.values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), ClientError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Preferences persisted as a flat JSON object on disk.
///
/// The whole file is rewritten on every change; a missing file reads as empty.
#[derive(Debug)]
pub struct FilePrefs {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FilePrefs {
    /// Load preferences from `path`.
    pub fn load(path: &Path) -> Result<Self, ClientError> {
        let values = match std::fs::read_to_string(path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| ClientError::Prefs(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(ClientError::Prefs(format!("{}: {e}", path.display()))),
        };
        Ok(Self { path: path.to_owned(), values })
    }

    fn flush(&self) -> Result<(), ClientError> {
        let json = serde_json::to_string_pretty(&self.values)
            .map_err(|e| ClientError::Prefs(e.to_string()))?;
        std::fs::write(&self.path, json)
            .map_err(|e| ClientError::Prefs(format!("{}: {e}", self.path.display())))
    }
}

impl PreferenceStore for FilePrefs {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ClientError> {
        self.values.insert(key.to_owned(), value.to_owned());
        self.flush()
    }

    fn delete(&mut self, key: &str) -> Result<(), ClientError> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "prefs_tests.rs"]
mod tests;
