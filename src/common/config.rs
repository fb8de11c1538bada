use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub settings: Settings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tabstrip: TabstripSettings,
    pub screen: ScreenSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TabstripSettings {
    /// Height of the strip window stacked above the active member.
    pub height: f64,
    /// Released strip windows kept around for reuse before we start closing.
    pub max_pooled: usize,
    /// Wait after unhiding a freshly positioned member before raising it.
    /// Heuristic against flashing stale content; not a delivery guarantee.
    pub render_settle_ms: u64,
    /// Wait before re-attaching the survivor of a disband to its old
    /// movement-group partner. Mitigates leave-notification ordering races
    /// in the window manager underneath; not a correctness guarantee.
    pub reattach_delay_ms: u64,
}

impl Default for TabstripSettings {
    fn default() -> Self {
        TabstripSettings {
            height: 60.0,
            max_pooled: 3,
            render_settle_ms: 100,
            reattach_delay_ms: 100,
        }
    }
}

impl TabstripSettings {
    pub fn render_settle(&self) -> Duration { Duration::from_millis(self.render_settle_ms) }

    pub fn reattach_delay(&self) -> Duration { Duration::from_millis(self.reattach_delay_ms) }
}

/// Screen extent handed to the simulated backend when no real window
/// manager is attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenSettings {
    pub width: f64,
    pub height: f64,
}

impl Default for ScreenSettings {
    fn default() -> Self {
        ScreenSettings {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tabrail")
        .join("config.toml")
}

impl Config {
    /// Loads the config at `path`, falling back to defaults if the file does
    /// not exist. A file that exists but fails to parse is an error.
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config at {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config at {}", path.display()))
    }
}
