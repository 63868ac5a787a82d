use std::{sync::Arc, time::Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    audio::{AudioChannelConfig, AudioOutput, AudioRoutingGraph},
    db::PersistenceSink,
    error::PlayerError,
    heatmap::HeatmapAccumulator,
    media::MediaHandle,
    models::{ActivityLog, MovieMeta, Record, SceneTag, Segment},
    segments::{SegmentStore, StoreChange},
    settings::PlayerSettings,
    subtitles::SubtitleCueSource,
    sync::SyncOffsets,
    tagging::{CommitOutcome, Marks, PendingTag, PendingTagSession, TagState, TriggerOutcome},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Point-in-time view of a session for display.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub filename: String,
    pub position_secs: f64,
    pub duration_secs: f64,
    pub is_playing: bool,
    pub tag_state: TagState,
    pub rating: u8,
    pub marks: Marks,
    pub segment_count: usize,
    pub offsets: SyncOffsets,
    pub audio: AudioChannelConfig,
    pub audio_routed: bool,
    pub watched_secs: f64,
}

/// Everything attached to one media element, from open to close.
pub struct PlayerSession {
    media: Arc<dyn MediaHandle>,
    persistence: Arc<dyn PersistenceSink>,
    settings: PlayerSettings,
    store: SegmentStore,
    tagging: PendingTagSession,
    heatmap: HeatmapAccumulator,
    offsets: SyncOffsets,
    audio: AudioChannelConfig,
    graph: AudioRoutingGraph,
    activity_id: String,
    started_at: DateTime<Utc>,
    watched_secs: f64,
    last_tick: Option<Instant>,
    ticks_since_save: u32,
    segments_committed: u32,
    closed: bool,
}

impl PlayerSession {
    /// Bind a session to `media`, restoring whatever the sink has for its filename.
    pub fn open(
        media: Arc<dyn MediaHandle>,
        persistence: Arc<dyn PersistenceSink>,
        output: Box<dyn AudioOutput>,
        settings: PlayerSettings,
    ) -> Result<Self, PlayerError> {
        let filename = media.filename().to_string();
        let duration = media.duration_secs();
        if !duration.is_finite() || duration <= 0.0 {
            return Err(PlayerError::MediaUnavailable {
                filename,
                reason: format!("invalid duration {duration}"),
            });
        }

        let (store, heatmap) = restore(persistence.as_ref(), &filename);
        log_info!(
            "opened '{}' with {} stored segments",
            filename,
            store.len()
        );

        let audio = AudioChannelConfig {
            volume: settings.default_volume.clamp(0.0, 1.0),
            ..AudioChannelConfig::default()
        };
        let ramp_ms = u32::try_from(settings.gain_ramp_ms).unwrap_or(u32::MAX);
        let mut graph = AudioRoutingGraph::new(output, ramp_ms);
        graph.configure(audio.clone());
        if let Err(err) = graph.attach(Arc::clone(&media)) {
            log_warn!("'{}' plays natively: {err}", filename);
        }

        Ok(Self {
            tagging: PendingTagSession::new(settings.tagging()),
            media,
            persistence,
            settings,
            store,
            heatmap,
            offsets: SyncOffsets::new(),
            audio,
            graph,
            activity_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            watched_secs: 0.0,
            last_tick: None,
            ticks_since_save: 0,
            segments_committed: 0,
            closed: false,
        })
    }

    pub fn filename(&self) -> &str {
        self.media.filename()
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    pub fn segments(&self) -> &[Segment] {
        self.store.segments()
    }

    pub fn segment_at(&self, time: f64) -> Option<&Segment> {
        self.store.segment_at(time)
    }

    pub fn tag_state(&self) -> &TagState {
        self.tagging.state()
    }

    pub fn pending(&self) -> Option<&PendingTag> {
        self.tagging.pending()
    }

    pub fn rating(&self) -> u8 {
        self.tagging.rating()
    }

    pub fn marks(&self) -> Marks {
        self.tagging.marks()
    }

    pub fn heatmap(&self) -> &HeatmapAccumulator {
        &self.heatmap
    }

    pub fn offsets(&self) -> SyncOffsets {
        self.offsets
    }

    pub fn audio_config(&self) -> &AudioChannelConfig {
        &self.audio
    }

    pub fn audio_graph(&self) -> &AudioRoutingGraph {
        &self.graph
    }

    pub fn watched_secs(&self) -> f64 {
        self.watched_secs
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            filename: self.filename().to_string(),
            position_secs: self.media.position_secs(),
            duration_secs: self.media.duration_secs(),
            is_playing: self.media.is_playing(),
            tag_state: self.tagging.state().clone(),
            rating: self.tagging.rating(),
            marks: self.tagging.marks(),
            segment_count: self.store.len(),
            offsets: self.offsets,
            audio: self.audio.clone(),
            audio_routed: self.graph.is_routed(),
            watched_secs: self.watched_secs,
        }
    }

    // Ticks

    /// Periodic playback tick: heatmap, watched time, rating buffer expiry and
    /// the periodic movie meta save. Returns the heatmap bucket that was bumped.
    pub fn on_playback_tick(&mut self, now: Instant) -> Option<usize> {
        if self.closed {
            return None;
        }

        let playing = self.media.is_playing();
        let bucket = self.heatmap.tick(self.media.position_fraction(), playing);

        if let Some(last) = self.last_tick {
            if playing {
                self.watched_secs += now.saturating_duration_since(last).as_secs_f64();
            }
        }
        self.last_tick = Some(now);

        self.tagging.expire_rating_buffer(now);

        self.ticks_since_save += 1;
        if self.ticks_since_save >= self.settings.save_interval_ticks() {
            self.ticks_since_save = 0;
            self.save_movie_meta();
        }

        bucket
    }

    /// One countdown step. Commits the pending tag when the countdown runs out.
    pub fn on_countdown_tick(&mut self) -> Option<CommitOutcome> {
        if self.closed {
            return None;
        }
        let outcome = self.tagging.countdown_tick(&mut self.store)?;
        log_debug!("countdown committed segment {}", outcome.segment.id);
        self.record_commit(&outcome);
        Some(outcome)
    }

    // Tagging

    /// Start or restart a pending tag at the current position. `None` once closed.
    pub fn trigger_tag(&mut self, tag: SceneTag) -> Option<TriggerOutcome> {
        if self.closed {
            return None;
        }
        let current_time = self.media.position_secs();
        let outcome = self.tagging.trigger(tag, current_time, &mut self.store);
        if let Some(forced) = &outcome.forced {
            self.record_commit(forced);
        }
        Some(outcome)
    }

    pub fn press_digit(&mut self, digit: u8, now: Instant) -> u8 {
        if self.closed {
            return self.tagging.rating();
        }
        self.tagging.press_digit(digit, now)
    }

    pub fn set_rating(&mut self, rating: u8) {
        if self.closed {
            return;
        }
        self.tagging.set_rating(rating);
    }

    pub fn commit_pending(&mut self) -> Option<CommitOutcome> {
        if self.closed {
            return None;
        }
        let outcome = self.tagging.commit(&mut self.store)?;
        self.record_commit(&outcome);
        Some(outcome)
    }

    pub fn discard_pending(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.tagging.discard()
    }

    pub fn set_mark_in(&mut self) -> Marks {
        if self.closed {
            return self.tagging.marks();
        }
        self.tagging.set_mark_in(self.media.position_secs());
        self.tagging.marks()
    }

    pub fn set_mark_out(&mut self) -> Marks {
        if self.closed {
            return self.tagging.marks();
        }
        self.tagging.set_mark_out(self.media.position_secs());
        self.tagging.marks()
    }

    pub fn clear_marks(&mut self) {
        if self.closed {
            return;
        }
        self.tagging.clear_marks();
    }

    // Segment edits

    pub fn set_segment_description(&mut self, id: &str, description: Option<String>) -> bool {
        if self.closed {
            return false;
        }
        let Some(segment) = self.store.set_description(id, description).cloned() else {
            return false;
        };
        self.save_segment(segment);
        true
    }

    pub fn set_segment_rating(&mut self, id: &str, rating: u8) -> bool {
        if self.closed {
            return false;
        }
        let Some(segment) = self.store.set_rating(id, rating).cloned() else {
            return false;
        };
        self.save_segment(segment);
        true
    }

    pub fn delete_segment(&mut self, id: &str) -> bool {
        if self.closed {
            return false;
        }
        if self.store.remove(id).is_none() {
            return false;
        }
        self.persistence.save(Record::SegmentRemoved {
            filename: self.filename().to_string(),
            id: id.to_string(),
        });
        true
    }

    /// Seek the media to the start of a stored segment.
    pub fn seek_to_segment(&self, id: &str) -> bool {
        match self.store.get(id) {
            Some(segment) => {
                self.media.seek(segment.start_time);
                true
            }
            None => false,
        }
    }

    // Sync offsets

    pub fn adjust_subtitle_offset(&mut self, delta: f64) -> f64 {
        self.offsets.adjust_subtitle(delta)
    }

    pub fn nudge_subtitle_offset(&mut self, later: bool) -> f64 {
        self.offsets.nudge_subtitle(later)
    }

    pub fn adjust_audio_offset(&mut self, delta: f64) -> f64 {
        let offset = self.offsets.adjust_audio(delta);
        self.sync_audio_delay();
        offset
    }

    pub fn nudge_audio_offset(&mut self, later: bool) -> f64 {
        let offset = self.offsets.nudge_audio(later);
        self.sync_audio_delay();
        offset
    }

    pub fn reset_offsets(&mut self) {
        self.offsets.reset_subtitle();
        self.offsets.reset_audio();
        self.sync_audio_delay();
    }

    fn sync_audio_delay(&mut self) {
        self.audio.audio_delay_secs = self.offsets.audio_delay_secs();
        self.reconfigure();
    }

    /// Captions visible now, with the subtitle offset applied.
    pub fn active_captions(&self, source: &dyn SubtitleCueSource) -> Vec<String> {
        source.active_cues(self.offsets.subtitle_time(self.media.position_secs()))
    }

    // Audio

    pub fn toggle_channel(&mut self, channel: usize) -> bool {
        if !self.audio.toggle_channel(channel) {
            return false;
        }
        self.reconfigure();
        true
    }

    pub fn toggle_cinema(&mut self) -> bool {
        self.audio.cinema_mode = !self.audio.cinema_mode;
        self.reconfigure();
        self.audio.cinema_mode
    }

    pub fn toggle_bypass(&mut self) -> bool {
        self.audio.bypass = !self.audio.bypass;
        self.reconfigure();
        self.audio.bypass
    }

    pub fn toggle_pure_native(&mut self) -> bool {
        self.audio.pure_native = !self.audio.pure_native;
        self.reconfigure();
        self.audio.pure_native
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.audio.muted = !self.audio.muted;
        self.reconfigure();
        self.audio.muted
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.audio.volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.reconfigure();
    }

    fn reconfigure(&mut self) {
        self.graph.configure(self.audio.clone());
    }

    // Teardown

    /// Commit any pending tag, flush movie meta and the activity log, and hand
    /// audio back to the media element. Returns `None` if already closed.
    pub fn close(&mut self) -> Option<ActivityLog> {
        if self.closed {
            return None;
        }

        self.commit_pending();
        self.save_movie_meta();

        let log = ActivityLog {
            id: self.activity_id.clone(),
            filename: self.filename().to_string(),
            started_at: self.started_at,
            ended_at: Utc::now(),
            watched_secs: self.watched_secs,
            segments_committed: self.segments_committed,
        };
        self.persistence.save(Record::Activity(log.clone()));

        self.graph.detach();
        self.closed = true;
        log_info!(
            "closed '{}' after {:.1}s watched, {} segments committed",
            log.filename,
            log.watched_secs,
            log.segments_committed
        );
        Some(log)
    }

    fn record_commit(&mut self, outcome: &CommitOutcome) {
        self.segments_committed += 1;
        self.save_change(&outcome.change);
    }

    fn save_change(&self, change: &StoreChange) {
        for id in &change.removed {
            self.persistence.save(Record::SegmentRemoved {
                filename: self.filename().to_string(),
                id: id.clone(),
            });
        }
        for segment in &change.upserted {
            self.save_segment(segment.clone());
        }
    }

    fn save_segment(&self, segment: Segment) {
        self.persistence.save(Record::Segment {
            filename: self.filename().to_string(),
            segment,
        });
    }

    fn save_movie_meta(&self) {
        self.persistence.save(Record::Movie(MovieMeta {
            filename: self.filename().to_string(),
            duration_secs: self.media.duration_secs(),
            last_played_at: Utc::now(),
            heatmap: self.heatmap.snapshot(),
        }));
    }
}

fn restore(persistence: &dyn PersistenceSink, filename: &str) -> (SegmentStore, HeatmapAccumulator) {
    let records = match persistence.load_by_filename(filename) {
        Ok(records) => records,
        Err(err) => {
            log_warn!("failed to load history for '{}': {err:#}", filename);
            return (SegmentStore::new(), HeatmapAccumulator::new());
        }
    };

    let mut segments = Vec::new();
    let mut heatmap = HeatmapAccumulator::new();
    for record in records {
        match record {
            Record::Segment { segment, .. } => segments.push(segment),
            Record::Movie(meta) => heatmap = HeatmapAccumulator::from_snapshot(&meta.heatmap),
            Record::SegmentRemoved { .. } | Record::Activity(_) => {}
        }
    }
    (SegmentStore::from_segments(segments), heatmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        audio::RoutedSource,
        db::MemorySink,
        error::{AttachError, MediaError},
        media::{AudioTap, OutputMode},
        subtitles::{Cue, CueTrack},
    };
    use std::{
        sync::Mutex,
        time::Duration,
    };

    struct SilentTap;

    impl AudioTap for SilentTap {
        fn channels(&self) -> u16 {
            2
        }

        fn sample_rate(&self) -> u32 {
            48_000
        }

        fn read(&mut self, buf: &mut [f32]) -> usize {
            buf.fill(0.0);
            buf.len()
        }
    }

    struct FakeMedia {
        duration: f64,
        position: Mutex<f64>,
        playing: Mutex<bool>,
        mode: Mutex<Option<OutputMode>>,
        tappable: bool,
    }

    impl FakeMedia {
        fn new(duration: f64) -> Arc<Self> {
            Arc::new(Self {
                duration,
                position: Mutex::new(0.0),
                playing: Mutex::new(true),
                mode: Mutex::new(None),
                tappable: true,
            })
        }

        fn at(&self, secs: f64) {
            *self.position.lock().unwrap() = secs;
        }
    }

    impl MediaHandle for FakeMedia {
        fn filename(&self) -> &str {
            "feature.mkv"
        }

        fn position_secs(&self) -> f64 {
            *self.position.lock().unwrap()
        }

        fn duration_secs(&self) -> f64 {
            self.duration
        }

        fn is_playing(&self) -> bool {
            *self.playing.lock().unwrap()
        }

        fn seek(&self, secs: f64) {
            self.at(secs);
        }

        fn open_audio_tap(&self) -> Result<Box<dyn AudioTap>, MediaError> {
            if self.tappable {
                Ok(Box::new(SilentTap))
            } else {
                Err(MediaError::Blocked("cross-origin".into()))
            }
        }

        fn set_output_mode(&self, mode: OutputMode) {
            *self.mode.lock().unwrap() = Some(mode);
        }
    }

    struct NullOutput;

    impl AudioOutput for NullOutput {
        fn start(&mut self, _source: RoutedSource) -> Result<(), AttachError> {
            Ok(())
        }

        fn stop(&mut self) {}
    }

    fn open_with(media: Arc<FakeMedia>, sink: Arc<MemorySink>) -> PlayerSession {
        PlayerSession::open(media, sink, Box::new(NullOutput), PlayerSettings::default())
            .expect("open failed")
    }

    fn saved_segments(sink: &MemorySink) -> Vec<Segment> {
        sink.records()
            .into_iter()
            .filter_map(|record| match record {
                Record::Segment { segment, .. } => Some(segment),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn rejects_media_without_duration() {
        let media = FakeMedia::new(f64::NAN);
        let result = PlayerSession::open(
            media,
            Arc::new(MemorySink::new()),
            Box::new(NullOutput),
            PlayerSettings::default(),
        );
        assert!(matches!(result, Err(PlayerError::MediaUnavailable { .. })));
    }

    #[test]
    fn blocked_audio_falls_back_to_native() {
        let media = Arc::new(FakeMedia {
            tappable: false,
            ..Arc::into_inner(FakeMedia::new(60.0)).expect("unique arc")
        });
        let session = open_with(media.clone(), Arc::new(MemorySink::new()));

        assert!(!session.audio_graph().is_routed());
        assert!(matches!(
            *media.mode.lock().unwrap(),
            Some(OutputMode::Native { .. })
        ));
    }

    #[test]
    fn countdown_commits_with_the_last_rating() {
        let media = FakeMedia::new(600.0);
        let sink = Arc::new(MemorySink::new());
        let mut session = open_with(media.clone(), sink.clone());

        media.at(12.0);
        session.trigger_tag(SceneTag::Fight);
        let now = Instant::now();
        session.press_digit(8, now);
        session.press_digit(5, now);

        let mut commits = Vec::new();
        for _ in 0..20 {
            if let Some(outcome) = session.on_countdown_tick() {
                commits.push(outcome);
            }
        }

        assert_eq!(commits.len(), 1);
        let segment = &commits[0].segment;
        assert_eq!((segment.start_time, segment.end_time), (7.0, 12.0));
        assert_eq!(segment.rating, 85);
        assert_eq!(saved_segments(&sink), vec![segment.clone()]);
        assert_eq!(session.rating(), 50);
    }

    #[test]
    fn retriggering_flushes_the_previous_tag() {
        let media = FakeMedia::new(600.0);
        let sink = Arc::new(MemorySink::new());
        let mut session = open_with(media.clone(), sink.clone());

        media.at(12.0);
        session.trigger_tag(SceneTag::Action);
        media.at(20.0);
        let outcome = session
            .trigger_tag(SceneTag::Dialogue)
            .expect("trigger failed");

        let forced = outcome.forced.expect("previous tag committed");
        assert_eq!(forced.segment.tag, SceneTag::Action);
        assert_eq!((outcome.pending.start_time, outcome.pending.end_time), (15.0, 20.0));
        assert_eq!(saved_segments(&sink).len(), 1);
    }

    #[test]
    fn edits_and_deletes_reach_the_sink() {
        let media = FakeMedia::new(600.0);
        let sink = Arc::new(MemorySink::new());
        let mut session = open_with(media.clone(), sink.clone());

        media.at(30.0);
        session.trigger_tag(SceneTag::Romance);
        let id = session.commit_pending().expect("commit").segment.id;

        assert!(session.set_segment_description(&id, Some("  balcony  ".into())));
        assert!(session.set_segment_rating(&id, 150));
        assert!(!session.set_segment_rating("missing", 10));

        let latest = saved_segments(&sink).pop().expect("saved");
        assert_eq!(latest.description.as_deref(), Some("balcony"));
        assert_eq!(latest.rating, 100);

        assert!(session.seek_to_segment(&id));
        assert_eq!(media.position_secs(), 25.0);

        assert!(session.delete_segment(&id));
        assert!(session.segments().is_empty());
        assert!(sink
            .load_by_filename("feature.mkv")
            .expect("load")
            .iter()
            .all(|record| !matches!(record, Record::Segment { .. })));
    }

    #[test]
    fn reopening_restores_segments_and_heatmap() {
        let media = FakeMedia::new(100.0);
        let sink = Arc::new(MemorySink::new());
        {
            let mut session = open_with(media.clone(), sink.clone());
            media.at(50.0);
            session.on_playback_tick(Instant::now());
            session.trigger_tag(SceneTag::Twist);
            session.close().expect("first close");
            assert!(session.close().is_none());
        }

        let session = open_with(media.clone(), sink.clone());
        assert_eq!(session.segments().len(), 1);
        assert_eq!(session.heatmap().bucket(50), 1);
    }

    #[test]
    fn closed_session_ignores_tagging_and_edits() {
        let media = FakeMedia::new(100.0);
        let sink = Arc::new(MemorySink::new());
        let mut session = open_with(media.clone(), sink.clone());

        media.at(30.0);
        session.trigger_tag(SceneTag::Action);
        session.close().expect("close failed");
        let id = session.segments()[0].id.clone();
        let saved = sink.records().len();

        media.at(60.0);
        assert!(session.trigger_tag(SceneTag::Fight).is_none());
        assert!(session.pending().is_none());
        assert_eq!(session.press_digit(9, Instant::now()), 50);
        assert_eq!(session.set_mark_in(), Marks::default());
        assert!(!session.set_segment_rating(&id, 10));
        assert!(!session.delete_segment(&id));
        assert!(session.on_countdown_tick().is_none());

        assert_eq!(session.segments().len(), 1);
        assert_eq!(sink.records().len(), saved);
    }

    #[test]
    fn playback_ticks_track_watched_time_while_playing() {
        let media = FakeMedia::new(100.0);
        let mut session = open_with(media.clone(), Arc::new(MemorySink::new()));

        let start = Instant::now();
        session.on_playback_tick(start);
        session.on_playback_tick(start + Duration::from_millis(250));
        *media.playing.lock().unwrap() = false;
        session.on_playback_tick(start + Duration::from_millis(500));

        assert!((session.watched_secs() - 0.25).abs() < 1e-9);
        assert_eq!(session.heatmap().total(), 2);
    }

    #[test]
    fn audio_offset_drives_the_delay_stage() {
        let media = FakeMedia::new(100.0);
        let mut session = open_with(media, Arc::new(MemorySink::new()));

        session.adjust_audio_offset(0.3);
        assert!((session.audio_config().audio_delay_secs - 0.3).abs() < 1e-9);

        session.adjust_audio_offset(-1.0);
        assert_eq!(session.audio_config().audio_delay_secs, 0.0);

        session.adjust_audio_offset(0.5);
        session.reset_offsets();
        assert_eq!(session.audio_config().audio_delay_secs, 0.0);
        assert_eq!(session.offsets(), SyncOffsets::default());
    }

    #[test]
    fn captions_follow_the_subtitle_offset() {
        let media = FakeMedia::new(100.0);
        let mut session = open_with(media.clone(), Arc::new(MemorySink::new()));
        let track = CueTrack::new(vec![Cue {
            start: 10.0,
            end: 11.0,
            text: "late line".into(),
        }]);

        media.at(11.5);
        assert!(session.active_captions(&track).is_empty());

        session.adjust_subtitle_offset(1.0);
        assert_eq!(session.active_captions(&track), vec!["late line"]);
    }

    #[test]
    fn audio_toggles_rewire_the_graph() {
        let media = FakeMedia::new(100.0);
        let mut session = open_with(media.clone(), Arc::new(MemorySink::new()));
        assert_eq!(session.audio_graph().topology().edge_count(), 16);

        assert!(session.toggle_cinema());
        assert_eq!(session.audio_graph().topology().edge_count(), 17);

        assert!(session.toggle_bypass());
        assert_eq!(session.audio_graph().topology().edge_count(), 2);

        assert!(session.toggle_pure_native());
        assert!(session.audio_graph().topology().is_empty());
        assert!(!session.snapshot().audio_routed);

        assert!(!session.toggle_channel(9));
        assert!(session.toggle_mute());
        assert_eq!(
            *media.mode.lock().unwrap(),
            Some(OutputMode::Native {
                volume: 1.0,
                muted: true
            })
        );
    }
}
