use std::collections::HashSet;

use serde::Serialize;

use crate::models::{Segment, MAX_RATING};

use super::resolve::{carve, classify, Overlap};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = false;

use crate::log_debug;

/// What an insert or edit changed, so callers can mirror it into persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreChange {
    /// Segments that are new or whose fields changed, in start order.
    pub upserted: Vec<Segment>,
    /// Ids that no longer exist in the store.
    pub removed: Vec<String>,
}

impl StoreChange {
    pub fn is_empty(&self) -> bool {
        self.upserted.is_empty() && self.removed.is_empty()
    }
}

/// Sorted, pairwise non-overlapping set of tagged scene intervals.
#[derive(Debug, Clone, Default)]
pub struct SegmentStore {
    segments: Vec<Segment>,
}

impl SegmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from previously persisted segments, replaying them in start
    /// order so any stored overlap is resolved the same way a live insert would.
    pub fn from_segments(segments: impl IntoIterator<Item = Segment>) -> Self {
        let mut loaded: Vec<Segment> = segments.into_iter().collect();
        loaded.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

        let mut store = Self::new();
        for segment in loaded {
            store.insert(segment);
        }
        store
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Segment> {
        self.segments.iter().find(|segment| segment.id == id)
    }

    /// Insert with newest-wins overlap resolution.
    ///
    /// Existing segments covered by the incoming interval are removed, ones that
    /// straddle an edge are truncated, and one that strictly contains it is split.
    /// Fragments no longer than `MIN_SEGMENT_SECS` are dropped afterwards.
    pub fn insert(&mut self, incoming: Segment) -> StoreChange {
        let (start, end) = (incoming.start_time, incoming.end_time);
        if !start.is_finite() || !end.is_finite() || incoming.is_degenerate() {
            log_debug!("ignoring degenerate segment [{start}, {end})");
            return StoreChange::default();
        }

        let previous = std::mem::take(&mut self.segments);
        let previous_ids: Vec<String> = previous.iter().map(|s| s.id.clone()).collect();
        let mut changed_ids: HashSet<String> = HashSet::new();
        let mut next = Vec::with_capacity(previous.len() + 2);

        for existing in previous {
            if classify(&existing, start, end) == Overlap::Outside {
                next.push(existing);
                continue;
            }
            for piece in carve(existing, start, end) {
                changed_ids.insert(piece.id.clone());
                next.push(piece);
            }
        }

        changed_ids.insert(incoming.id.clone());
        next.push(incoming);
        next.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        next.retain(|segment| !segment.is_degenerate());

        let surviving: HashSet<&str> = next.iter().map(|s| s.id.as_str()).collect();
        let removed = previous_ids
            .into_iter()
            .filter(|id| !surviving.contains(id.as_str()))
            .collect();
        let upserted = next
            .iter()
            .filter(|segment| changed_ids.contains(&segment.id))
            .cloned()
            .collect();

        self.segments = next;
        StoreChange { upserted, removed }
    }

    pub fn remove(&mut self, id: &str) -> Option<Segment> {
        let index = self.segments.iter().position(|segment| segment.id == id)?;
        Some(self.segments.remove(index))
    }

    /// Replace a segment's description; blank text clears it.
    pub fn set_description(&mut self, id: &str, description: Option<String>) -> Option<&Segment> {
        let description = description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        let segment = self.segments.iter_mut().find(|segment| segment.id == id)?;
        segment.description = description;
        Some(segment)
    }

    pub fn set_rating(&mut self, id: &str, rating: u8) -> Option<&Segment> {
        let segment = self.segments.iter_mut().find(|segment| segment.id == id)?;
        segment.rating = rating.min(MAX_RATING);
        Some(segment)
    }

    /// Segment covering `time`, if any.
    pub fn segment_at(&self, time: f64) -> Option<&Segment> {
        let index = self.segments.partition_point(|s| s.start_time <= time);
        index
            .checked_sub(1)
            .map(|i| &self.segments[i])
            .filter(|segment| segment.contains_time(time))
    }

    /// End of the latest segment that finishes at or before `time`.
    pub fn last_end_at_or_before(&self, time: f64) -> Option<f64> {
        // Ends are sorted too because the segments never overlap.
        let index = self.segments.partition_point(|s| s.end_time <= time);
        index.checked_sub(1).map(|i| self.segments[i].end_time)
    }
}
