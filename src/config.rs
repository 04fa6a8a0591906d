//! Engine configuration (~/.config/ringsync/config.toml)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::format::AudioFormat;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Frame loop update rate in Hz
    #[serde(default = "default_update_hz")]
    pub update_hz: u32,
    /// Jitter cushion as a fraction of one frame's bytes.
    ///
    /// Absorbs frame-timing jitter on devices where perfect sync is not
    /// achievable. Empirical, not derived; raise it if a platform shows
    /// skipping, lower it for tighter latency.
    #[serde(default = "default_safety_margin")]
    pub safety_margin_frames: f32,
    /// Cursor marker history depth; 0 means one frame short of a second
    #[serde(default)]
    pub marker_history: usize,
}

fn default_update_hz() -> u32 {
    30
}

fn default_safety_margin() -> f32 {
    1.0 / 3.0
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            update_hz: 30,
            safety_margin_frames: 1.0 / 3.0,
            marker_history: 0,
        }
    }
}

impl SyncConfig {
    /// Safety cushion in bytes for `format`, aligned down to whole sample
    /// frames so cursor targets stay on frame boundaries.
    pub fn safety_bytes(&self, format: &AudioFormat) -> u32 {
        let per_update = format.bytes_per_update(self.update_hz);
        let raw = (per_update as f64 * self.safety_margin_frames as f64).round() as u32;
        raw - raw % format.block_align()
    }

    /// Marker ring depth: explicit override, or `update_hz - 1`
    pub fn marker_depth(&self) -> usize {
        if self.marker_history != 0 {
            self.marker_history
        } else {
            self.update_hz.saturating_sub(1).max(1) as usize
        }
    }
}

pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "ringsync").map(|dirs| dirs.config_dir().to_path_buf())
}

pub fn load() -> SyncConfig {
    config_dir()
        .map(|dir| load_from(&dir.join("config.toml")))
        .unwrap_or_default()
}

pub fn load_from(path: &Path) -> SyncConfig {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|content| toml::from_str(&content).ok())
        .unwrap_or_default()
}

pub fn save(config: &SyncConfig) -> std::io::Result<()> {
    if let Some(dir) = config_dir() {
        std::fs::create_dir_all(&dir)?;
        save_to(config, &dir.join("config.toml"))?;
    }
    Ok(())
}

pub fn save_to(config: &SyncConfig, path: &Path) -> std::io::Result<()> {
    let content = toml::to_string_pretty(config).map_err(std::io::Error::other)?;
    std::fs::write(path, content)
}
