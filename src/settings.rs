use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::tagging::TaggingConfig;

const DEBUG_ENV: &str = "CINEREVIEW_DEBUG";

/// Tunables for one player session and its driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerSettings {
    pub lookback_secs: f64,
    pub countdown_ticks: u32,
    pub countdown_tick_ms: u64,
    pub playback_tick_ms: u64,
    pub rating_idle_ms: u64,
    pub default_rating: u8,
    pub gain_ramp_ms: u64,
    pub heatmap_save_every_ticks: u32,
    pub default_volume: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            lookback_secs: 5.0,
            countdown_ticks: 15,
            countdown_tick_ms: 1000,
            playback_tick_ms: 250,
            rating_idle_ms: 1500,
            default_rating: 50,
            gain_ramp_ms: 30,
            heatmap_save_every_ticks: 20,
            default_volume: 1.0,
        }
    }
}

impl PlayerSettings {
    pub fn tagging(&self) -> TaggingConfig {
        TaggingConfig {
            lookback_secs: self.lookback_secs.max(0.0),
            countdown_ticks: self.countdown_ticks.max(1),
            default_rating: self.default_rating.min(crate::models::MAX_RATING),
            rating_idle_reset: Duration::from_millis(self.rating_idle_ms),
        }
    }

    pub fn playback_tick(&self) -> Duration {
        Duration::from_millis(self.playback_tick_ms.max(1))
    }

    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms.max(1))
    }

    /// Ticks between heatmap saves. Debug mode saves on every tick.
    pub fn save_interval_ticks(&self) -> u32 {
        if debug_enabled() {
            1
        } else {
            self.heatmap_save_every_ticks.max(1)
        }
    }
}

/// True when `CINEREVIEW_DEBUG` is set to `1` or `true`.
pub fn debug_enabled() -> bool {
    std::env::var(DEBUG_ENV)
        .map(|value| matches!(value.trim(), "1" | "true" | "TRUE"))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct UserSettings {
    player: PlayerSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!(
                    "Ignoring unreadable settings at {}: {}",
                    path.display(),
                    err
                );
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn player(&self) -> PlayerSettings {
        self.read().player.clone()
    }

    pub fn update_player(&self, settings: PlayerSettings) -> Result<()> {
        let mut guard = self.write();
        guard.player = settings;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: UserSettings = serde_json::from_str(&contents)?;
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, UserSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserSettings> {
        self.data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_is_missing() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let store = SettingsStore::new(dir.path().join("settings.json")).expect("open failed");
        assert_eq!(store.player(), PlayerSettings::default());
    }

    #[test]
    fn updates_persist_and_reload() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let path = dir.path().join("nested").join("settings.json");
        let store = SettingsStore::new(path.clone()).expect("open failed");

        let mut settings = store.player();
        settings.countdown_ticks = 10;
        settings.lookback_secs = 3.0;
        store.update_player(settings.clone()).expect("update failed");

        let reopened = SettingsStore::new(path).expect("reopen failed");
        assert_eq!(reopened.player(), settings);
        reopened.reload().expect("reload failed");
        assert_eq!(reopened.player().countdown_ticks, 10);
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"player":{"countdownTicks":7}}"#).expect("write failed");

        let store = SettingsStore::new(path).expect("open failed");
        let player = store.player();
        assert_eq!(player.countdown_ticks, 7);
        assert_eq!(player.playback_tick_ms, 250);

        let tagging = player.tagging();
        assert_eq!(tagging.countdown_ticks, 7);
        assert_eq!(tagging.rating_idle_reset, Duration::from_millis(1500));
    }
}
