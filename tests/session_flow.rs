//! End-to-end reviewer flow: keyboard commands through the driver, persisted to
//! SQLite, and restored on the next session.

use std::sync::{Arc, Mutex};

use cinereview::{
    audio::RoutedSource,
    player::{CommandOutcome, Key},
    App, AttachError, AudioOutput, AudioTap, KeyInput, MediaError, MediaHandle, OutputMode,
    PlayerCommand, SceneTag,
};
use tempfile::TempDir;

struct SilentTap;

impl AudioTap for SilentTap {
    fn channels(&self) -> u16 {
        2
    }

    fn sample_rate(&self) -> u32 {
        44_100
    }

    fn read(&mut self, buf: &mut [f32]) -> usize {
        buf.fill(0.0);
        buf.len()
    }
}

struct ScriptedMedia {
    position: Mutex<f64>,
    mode: Mutex<Option<OutputMode>>,
}

impl ScriptedMedia {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            position: Mutex::new(0.0),
            mode: Mutex::new(None),
        })
    }

    fn at(&self, secs: f64) {
        *self.position.lock().unwrap() = secs;
    }
}

impl MediaHandle for ScriptedMedia {
    fn filename(&self) -> &str {
        "night_train.mkv"
    }

    fn position_secs(&self) -> f64 {
        *self.position.lock().unwrap()
    }

    fn duration_secs(&self) -> f64 {
        5400.0
    }

    fn is_playing(&self) -> bool {
        true
    }

    fn seek(&self, secs: f64) {
        self.at(secs);
    }

    fn open_audio_tap(&self) -> Result<Box<dyn AudioTap>, MediaError> {
        Ok(Box::new(SilentTap))
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

fn press(ch: char) -> PlayerCommand {
    PlayerCommand::from_key(KeyInput::plain(Key::Char(ch))).expect("unmapped key")
}

fn special(key: Key) -> PlayerCommand {
    PlayerCommand::from_key(KeyInput::plain(key)).expect("unmapped key")
}

#[tokio::test]
async fn keyboard_session_persists_and_restores() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let app = App::open(dir.path()).expect("Failed to open app");
    let media = ScriptedMedia::new();

    let driver = app
        .open_session_with_output(media.clone(), Box::new(NullOutput))
        .expect("Failed to open session");

    // Auto-gap tag rated 90.
    media.at(10.0);
    driver.dispatch(press(SceneTag::Action.hotkey())).await;
    driver.dispatch(press('9')).await;
    driver.dispatch(press('0')).await;
    match driver.dispatch(special(Key::Enter)).await {
        CommandOutcome::Committed {
            outcome: Some(outcome),
        } => {
            assert_eq!(
                (outcome.segment.start_time, outcome.segment.end_time),
                (5.0, 10.0)
            );
            assert_eq!(outcome.segment.rating, 90);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    // Marked tag, discarded once, then committed with the same marks.
    media.at(20.0);
    driver.dispatch(press('[')).await;
    media.at(26.0);
    driver.dispatch(press(']')).await;
    driver.dispatch(press(SceneTag::Chase.hotkey())).await;
    driver.dispatch(special(Key::Escape)).await;
    driver.dispatch(press(SceneTag::Chase.hotkey())).await;
    driver.dispatch(special(Key::Enter)).await;

    // Newer tag truncates the start of the first one.
    media.at(3.0);
    driver.dispatch(press('[')).await;
    media.at(6.0);
    driver.dispatch(press(']')).await;
    driver.dispatch(press(SceneTag::Fight.hotkey())).await;
    driver.dispatch(special(Key::Enter)).await;

    driver
        .dispatch(PlayerCommand::from_key(KeyInput::alt(Key::Char('c'))).expect("unmapped key"))
        .await;
    assert!(driver.snapshot().await.audio.cinema_mode);

    let log = driver
        .shutdown()
        .await
        .expect("Failed to shut down")
        .expect("Missing activity log");
    assert_eq!(log.segments_committed, 3);
    assert!(matches!(
        *media.mode.lock().unwrap(),
        Some(OutputMode::Native { .. })
    ));

    let stored: Vec<(f64, f64, SceneTag)> = app
        .db()
        .segments_for("night_train.mkv")
        .await
        .expect("Failed to list segments")
        .into_iter()
        .map(|segment| (segment.start_time, segment.end_time, segment.tag))
        .collect();
    assert_eq!(
        stored,
        vec![
            (3.0, 6.0, SceneTag::Fight),
            (6.0, 10.0, SceneTag::Action),
            (20.0, 26.0, SceneTag::Chase),
        ]
    );

    let activity = app
        .db()
        .activity_for("night_train.mkv")
        .await
        .expect("Failed to list activity");
    assert_eq!(activity.len(), 1);
    assert!(app
        .db()
        .movie_meta("night_train.mkv")
        .await
        .expect("Failed to load meta")
        .is_some());

    let reopened = app
        .open_session_with_output(media.clone(), Box::new(NullOutput))
        .expect("Failed to reopen session");
    let snapshot = reopened.snapshot().await;
    assert_eq!(snapshot.segment_count, 3);
    assert_eq!(snapshot.rating, 50);
}
