use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SceneTag;

/// Fragments at or below this length (seconds) are discarded by the store.
pub const MIN_SEGMENT_SECS: f64 = 0.001;

pub const MAX_RATING: u8 = 100;
pub const NEUTRAL_RATING: u8 = 50;

/// A tagged, rated scene interval `[start_time, end_time)` in media seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: String,
    pub start_time: f64,
    pub end_time: f64,
    #[serde(rename = "type")]
    pub tag: SceneTag,
    pub rating: u8,
    pub description: Option<String>,
}

impl Segment {
    pub fn new(start_time: f64, end_time: f64, tag: SceneTag, rating: u8) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            start_time,
            end_time,
            tag,
            rating: rating.min(MAX_RATING),
            description: None,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.duration_secs() > MIN_SEGMENT_SECS)
    }

    pub fn overlaps(&self, other: &Segment) -> bool {
        self.start_time < other.end_time && other.start_time < self.end_time
    }

    pub fn contains_time(&self, time: f64) -> bool {
        self.start_time <= time && time < self.end_time
    }
}
