//! Per-tab display properties and the key-value contract they persist
//! through.
//!
//! Properties are keyed by the window's stable identity, read back on
//! insertion and written through whenever a caller updates them. When
//! nothing is persisted they derive from the live window's title and icon.

use std::path::PathBuf;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::common::collections::HashMap;
use crate::window::{WindowIdentity, WindowState};

/// Windows the restore mechanism creates while a saved layout is still
/// loading carry a generated name as their title; showing that raw value in
/// a tab is useless, so it renders as a literal loading label instead.
pub const RESTORE_PLACEHOLDER_PREFIX: &str = "wm-restore-placeholder-";
pub const LOADING_TAB_TITLE: &str = "Loading...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabProperties {
    pub icon: String,
    pub title: String,
}

impl TabProperties {
    pub fn derive(state: &WindowState) -> TabProperties {
        let title = if state.title.starts_with(RESTORE_PLACEHOLDER_PREFIX) {
            LOADING_TAB_TITLE.to_string()
        } else {
            state.title.clone()
        };
        TabProperties {
            icon: state.icon.clone(),
            title,
        }
    }

    pub fn merge(&mut self, delta: &TabPropertiesDelta) {
        if let Some(icon) = &delta.icon {
            self.icon = icon.clone();
        }
        if let Some(title) = &delta.title {
            self.title = title.clone();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabPropertiesDelta {
    pub icon: Option<String>,
    pub title: Option<String>,
}

/// Key-value persistence for tab properties. Anything beyond read/write by
/// identity is someone else's problem.
pub trait PropertyStore {
    fn read(&self, identity: &WindowIdentity) -> Option<TabProperties>;
    fn write(&self, identity: &WindowIdentity, properties: &TabProperties);
}

#[derive(Default)]
pub struct MemoryPropertyStore {
    entries: Mutex<HashMap<WindowIdentity, TabProperties>>,
}

impl MemoryPropertyStore {
    pub fn new() -> Self { Self::default() }
}

impl PropertyStore for MemoryPropertyStore {
    fn read(&self, identity: &WindowIdentity) -> Option<TabProperties> {
        self.entries.lock().get(identity).cloned()
    }

    fn write(&self, identity: &WindowIdentity, properties: &TabProperties) {
        self.entries.lock().insert(identity.clone(), properties.clone());
    }
}

/// JSON file store the daemon uses. Persistence is best effort: a write
/// failure is logged and the in-memory view stays current.
pub struct JsonPropertyStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, TabProperties>>,
}

impl JsonPropertyStore {
    pub fn open(path: PathBuf) -> Self {
        let entries = std::fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        JsonPropertyStore {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn save(&self, entries: &HashMap<String, TabProperties>) {
        let result = serde_json::to_string_pretty(entries)
            .map_err(std::io::Error::other)
            .and_then(|raw| {
                if let Some(parent) = self.path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&self.path, raw)
            });
        if let Err(err) = result {
            warn!(?err, path = %self.path.display(), "failed to persist tab properties");
        }
    }
}

impl PropertyStore for JsonPropertyStore {
    fn read(&self, identity: &WindowIdentity) -> Option<TabProperties> {
        self.entries.lock().get(&identity.to_string()).cloned()
    }

    fn write(&self, identity: &WindowIdentity, properties: &TabProperties) {
        let mut entries = self.entries.lock();
        entries.insert(identity.to_string(), properties.clone());
        self.save(&entries);
    }
}
