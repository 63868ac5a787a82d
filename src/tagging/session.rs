use std::time::Instant;

use serde::Serialize;

use crate::{
    models::{SceneTag, Segment, MAX_RATING},
    segments::{SegmentStore, StoreChange},
};

use super::{
    config::TaggingConfig,
    rating::RatingBuffer,
    state::{Marks, PendingTag, TagState},
};

/// Result of turning a pending tag into a segment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitOutcome {
    pub segment: Segment,
    pub change: StoreChange,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerOutcome {
    /// The previous pending tag, committed to make room for the new one.
    pub forced: Option<CommitOutcome>,
    pub pending: PendingTag,
}

/// Manages the single in-flight scene tag on top of a `SegmentStore`.
#[derive(Debug, Clone)]
pub struct PendingTagSession {
    state: TagState,
    marks: Marks,
    /// Marks consumed by the pending tag, handed back if it is discarded.
    claimed: Marks,
    rating: u8,
    buffer: RatingBuffer,
    config: TaggingConfig,
}

impl Default for PendingTagSession {
    fn default() -> Self {
        Self::new(TaggingConfig::default())
    }
}

impl PendingTagSession {
    pub fn new(config: TaggingConfig) -> Self {
        Self {
            state: TagState::Idle,
            marks: Marks::default(),
            claimed: Marks::default(),
            rating: config.default_rating.min(MAX_RATING),
            buffer: RatingBuffer::new(config.rating_idle_reset),
            config,
        }
    }

    pub fn state(&self) -> &TagState {
        &self.state
    }

    pub fn pending(&self) -> Option<&PendingTag> {
        self.state.pending()
    }

    pub fn marks(&self) -> Marks {
        self.marks
    }

    pub fn rating(&self) -> u8 {
        self.rating
    }

    pub fn set_mark_in(&mut self, time: f64) {
        self.marks.mark_in = Some(time.max(0.0));
    }

    pub fn set_mark_out(&mut self, time: f64) {
        self.marks.mark_out = Some(time.max(0.0));
    }

    pub fn clear_marks(&mut self) {
        self.marks = Marks::default();
    }

    /// Start a new pending tag at `current_time`, committing any tag still pending.
    pub fn trigger(&mut self, tag: SceneTag, current_time: f64, store: &mut SegmentStore) -> TriggerOutcome {
        // Marks belong to the tag being triggered, not the one being flushed.
        let marks = std::mem::take(&mut self.marks);
        let forced = self.commit(store);
        self.claimed = marks;

        let last_end = store.last_end_at_or_before(current_time);
        let (start_time, end_time) = marks.resolve(current_time, last_end, self.config.lookback_secs);
        let pending = PendingTag {
            tag,
            start_time,
            end_time,
            ticks_remaining: self.config.countdown_ticks,
        };

        self.state = TagState::Pending(pending);
        TriggerOutcome { forced, pending }
    }

    /// Feed a keypad digit into the rating buffer.
    pub fn press_digit(&mut self, digit: u8, now: Instant) -> u8 {
        self.rating = self.buffer.push_digit(digit, now);
        self.rating
    }

    pub fn set_rating(&mut self, rating: u8) {
        self.buffer.clear();
        self.rating = rating.min(MAX_RATING);
    }

    pub fn expire_rating_buffer(&mut self, now: Instant) -> bool {
        self.buffer.expire(now)
    }

    /// Commit the pending tag into `store`. No-op unless a tag is pending.
    pub fn commit(&mut self, store: &mut SegmentStore) -> Option<CommitOutcome> {
        let pending = *self.state.pending()?;

        let segment = Segment::new(pending.start_time, pending.end_time, pending.tag, self.rating);
        let change = store.insert(segment.clone());

        self.state = TagState::Committed {
            segment_id: segment.id.clone(),
        };
        self.claimed = Marks::default();
        self.clear_marks();
        self.reset_rating();

        Some(CommitOutcome { segment, change })
    }

    /// Abandon the pending tag. Returns false if nothing was pending.
    pub fn discard(&mut self) -> bool {
        if !self.state.is_pending() {
            return false;
        }
        self.state = TagState::Discarded;
        let claimed = std::mem::take(&mut self.claimed);
        if self.marks.is_empty() {
            self.marks = claimed;
        }
        self.reset_rating();
        true
    }

    /// Advance the countdown; the tag commits when it reaches zero. Ticks that
    /// arrive with nothing pending are ignored.
    pub fn countdown_tick(&mut self, store: &mut SegmentStore) -> Option<CommitOutcome> {
        let TagState::Pending(pending) = &mut self.state else {
            return None;
        };

        pending.ticks_remaining = pending.ticks_remaining.saturating_sub(1);
        if pending.ticks_remaining > 0 {
            return None;
        }
        self.commit(store)
    }

    fn reset_rating(&mut self) {
        self.rating = self.config.default_rating.min(MAX_RATING);
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn trigger_uses_auto_gap_rule() {
        let mut store = SegmentStore::new();
        let mut tags = PendingTagSession::default();

        let outcome = tags.trigger(SceneTag::Action, 12.0, &mut store);
        assert!(outcome.forced.is_none());
        assert_eq!((outcome.pending.start_time, outcome.pending.end_time), (7.0, 12.0));
        assert_eq!(outcome.pending.ticks_remaining, 15);

        let mut store = SegmentStore::new();
        store.insert(Segment::new(4.0, 9.0, SceneTag::Drama, 50));
        let outcome = tags.trigger(SceneTag::Action, 12.0, &mut store);
        assert_eq!((outcome.pending.start_time, outcome.pending.end_time), (9.0, 12.0));
    }

    #[test]
    fn countdown_commits_with_last_rating() {
        let mut store = SegmentStore::new();
        let mut tags = PendingTagSession::default();
        let now = Instant::now();

        tags.trigger(SceneTag::Horror, 30.0, &mut store);
        tags.press_digit(8, now);
        tags.press_digit(5, now + Duration::from_millis(200));

        for _ in 0..14 {
            assert!(tags.countdown_tick(&mut store).is_none());
        }
        let outcome = tags.countdown_tick(&mut store).expect("countdown should commit");

        assert_eq!(outcome.segment.rating, 85);
        assert_eq!(store.len(), 1);
        assert_eq!(store.segments()[0].tag, SceneTag::Horror);
        assert!(matches!(tags.state(), TagState::Committed { .. }));
        assert_eq!(tags.rating(), 50);

        // Late ticks after resolution do nothing.
        assert!(tags.countdown_tick(&mut store).is_none());
        assert!(tags.commit(&mut store).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn discard_leaves_store_untouched() {
        let mut store = SegmentStore::new();
        let mut tags = PendingTagSession::default();

        tags.trigger(SceneTag::Comedy, 20.0, &mut store);
        tags.press_digit(9, Instant::now());
        assert!(tags.discard());

        assert!(store.is_empty());
        assert_eq!(tags.state(), &TagState::Discarded);
        assert_eq!(tags.rating(), 50);
        assert!(!tags.discard());
        assert!(tags.countdown_tick(&mut store).is_none());
    }

    #[test]
    fn second_trigger_force_commits_first() {
        let mut store = SegmentStore::new();
        let mut tags = PendingTagSession::default();

        tags.trigger(SceneTag::Chase, 10.0, &mut store);
        let outcome = tags.trigger(SceneTag::Fight, 14.0, &mut store);

        let forced = outcome.forced.expect("first tag should be committed");
        assert_eq!(forced.segment.tag, SceneTag::Chase);
        assert_eq!((forced.segment.start_time, forced.segment.end_time), (5.0, 10.0));
        assert_eq!((outcome.pending.start_time, outcome.pending.end_time), (10.0, 14.0));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn commit_consumes_marks() {
        let mut store = SegmentStore::new();
        let mut tags = PendingTagSession::default();

        tags.set_mark_in(40.0);
        tags.set_mark_out(52.0);
        let outcome = tags.trigger(SceneTag::Landscape, 60.0, &mut store);
        assert_eq!((outcome.pending.start_time, outcome.pending.end_time), (40.0, 52.0));

        let committed = tags.commit(&mut store).expect("commit failed");
        assert_eq!(committed.segment.duration_secs(), 12.0);
        assert!(tags.marks().is_empty());
    }

    #[test]
    fn marked_tag_survives_being_force_committed() {
        let mut store = SegmentStore::new();
        let mut tags = PendingTagSession::default();

        tags.set_mark_in(40.0);
        tags.set_mark_out(52.0);
        tags.trigger(SceneTag::Action, 60.0, &mut store);
        assert!(tags.marks().is_empty());

        let outcome = tags.trigger(SceneTag::Fight, 70.0, &mut store);
        let forced = outcome.forced.expect("first tag should be committed");
        assert_eq!((forced.segment.start_time, forced.segment.end_time), (40.0, 52.0));
        assert_eq!((outcome.pending.start_time, outcome.pending.end_time), (65.0, 70.0));

        tags.commit(&mut store).expect("commit failed");
        let stored: Vec<_> = store
            .segments()
            .iter()
            .map(|s| (s.start_time, s.end_time, s.tag))
            .collect();
        assert_eq!(
            stored,
            vec![(40.0, 52.0, SceneTag::Action), (65.0, 70.0, SceneTag::Fight)]
        );
    }

    #[test]
    fn marks_set_while_pending_go_to_the_next_tag() {
        let mut store = SegmentStore::new();
        let mut tags = PendingTagSession::default();

        tags.trigger(SceneTag::Drama, 10.0, &mut store);
        tags.set_mark_in(20.0);
        tags.set_mark_out(24.0);
        let outcome = tags.trigger(SceneTag::Music, 30.0, &mut store);

        assert_eq!((outcome.pending.start_time, outcome.pending.end_time), (20.0, 24.0));
        assert!(tags.marks().is_empty());
    }

    #[test]
    fn discard_hands_marks_back() {
        let mut store = SegmentStore::new();
        let mut tags = PendingTagSession::default();

        tags.set_mark_in(3.0);
        tags.set_mark_out(8.0);
        tags.trigger(SceneTag::Credits, 9.0, &mut store);
        assert!(tags.discard());
        assert_eq!(tags.marks().mark_in, Some(3.0));

        let outcome = tags.trigger(SceneTag::Credits, 9.0, &mut store);
        assert_eq!((outcome.pending.start_time, outcome.pending.end_time), (3.0, 8.0));
    }
}
