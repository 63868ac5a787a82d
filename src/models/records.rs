//! Persistence records exchanged with a `PersistenceSink`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Segment;

/// Per-title metadata, rewritten in full on every save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieMeta {
    pub filename: String,
    pub duration_secs: f64,
    pub last_played_at: DateTime<Utc>,
    pub heatmap: Vec<u32>,
}

/// Summary of one viewing session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: String,
    pub filename: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub watched_secs: f64,
    pub segments_committed: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Record {
    Segment { filename: String, segment: Segment },
    SegmentRemoved { filename: String, id: String },
    Movie(MovieMeta),
    Activity(ActivityLog),
}

impl Record {
    pub fn filename(&self) -> &str {
        match self {
            Record::Segment { filename, .. } | Record::SegmentRemoved { filename, .. } => filename,
            Record::Movie(meta) => &meta.filename,
            Record::Activity(log) => &log.filename,
        }
    }
}
