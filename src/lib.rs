//! Playback instrumentation for a cinematic review player: scene tagging with
//! newest-wins overlap resolution, a per-title viewing heatmap, subtitle and
//! audio sync offsets, and a multichannel audio routing graph.

pub mod audio;
pub mod db;
pub mod error;
pub mod heatmap;
pub mod media;
pub mod models;
pub mod player;
pub mod scan;
pub mod segments;
pub mod settings;
pub mod subtitles;
pub mod sync;
pub mod tagging;
pub mod utils;

use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};

pub use audio::{AudioChannelConfig, AudioOutput, AudioRoutingGraph, RodioOutput};
pub use db::{Database, MemorySink, PersistenceSink};
pub use error::{AttachError, MediaError, PlayerError};
pub use heatmap::{HeatmapAccumulator, HEATMAP_BUCKETS};
pub use media::{AudioTap, MediaHandle, OutputMode};
pub use models::{ActivityLog, MovieMeta, Record, SceneTag, Segment};
pub use player::{KeyInput, PlaybackDriver, PlayerCommand, PlayerSession, SessionSnapshot};
pub use scan::{ColorScanController, FrameSampler, ScanProgress};
pub use segments::{SegmentStore, StoreChange};
pub use settings::{PlayerSettings, SettingsStore};
pub use subtitles::{CueTrack, SubtitleCueSource, SubtitleError};
pub use sync::SyncOffsets;
pub use tagging::{PendingTagSession, TagState};

const DATABASE_FILE: &str = "cinereview.sqlite3";
const SETTINGS_FILE: &str = "settings.json";

/// Initialize `env_logger` from `RUST_LOG`, defaulting to Info.
pub fn init_logging() {
    let _ = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}

/// Process-level state shared by every session: the database and settings.
pub struct App {
    db: Database,
    settings: SettingsStore,
}

impl App {
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let db = Database::new(data_dir.join(DATABASE_FILE))?;
        let settings = SettingsStore::new(data_dir.join(SETTINGS_FILE))?;
        log::info!("cinereview ready in {}", data_dir.display());

        Ok(Self { db, settings })
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Open a session on `media` that plays through the default audio device.
    pub fn open_session(&self, media: Arc<dyn MediaHandle>) -> Result<PlaybackDriver, PlayerError> {
        self.open_session_with_output(media, Box::new(RodioOutput::new()))
    }

    pub fn open_session_with_output(
        &self,
        media: Arc<dyn MediaHandle>,
        output: Box<dyn AudioOutput>,
    ) -> Result<PlaybackDriver, PlayerError> {
        let session = PlayerSession::open(
            media,
            Arc::new(self.db.clone()),
            output,
            self.settings.player(),
        )?;
        Ok(PlaybackDriver::new(session))
    }
}
