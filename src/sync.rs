use serde::{Deserialize, Serialize};

/// Step used by the keyboard nudges, in seconds.
pub const OFFSET_STEP_SECS: f64 = 0.1;

/// Independent subtitle and audio offsets, in seconds.
///
/// A positive subtitle offset shows captions later; a positive audio offset delays
/// the processed audio. Only non-negative audio delay is realizable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOffsets {
    pub subtitle_offset_secs: f64,
    pub audio_offset_secs: f64,
}

impl SyncOffsets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn adjust_subtitle(&mut self, delta: f64) -> f64 {
        self.subtitle_offset_secs = round_millis(self.subtitle_offset_secs + delta);
        self.subtitle_offset_secs
    }

    pub fn adjust_audio(&mut self, delta: f64) -> f64 {
        self.audio_offset_secs = round_millis(self.audio_offset_secs + delta);
        self.audio_offset_secs
    }

    pub fn nudge_subtitle(&mut self, later: bool) -> f64 {
        self.adjust_subtitle(if later { OFFSET_STEP_SECS } else { -OFFSET_STEP_SECS })
    }

    pub fn nudge_audio(&mut self, later: bool) -> f64 {
        self.adjust_audio(if later { OFFSET_STEP_SECS } else { -OFFSET_STEP_SECS })
    }

    pub fn reset_subtitle(&mut self) {
        self.subtitle_offset_secs = 0.0;
    }

    pub fn reset_audio(&mut self) {
        self.audio_offset_secs = 0.0;
    }

    /// Time at which to look up captions for the given playback time.
    pub fn subtitle_time(&self, playback_secs: f64) -> f64 {
        playback_secs - self.subtitle_offset_secs
    }

    /// Delay to program into the audio delay stage.
    pub fn audio_delay_secs(&self) -> f64 {
        self.audio_offset_secs.max(0.0)
    }
}

fn round_millis(value: f64) -> f64 {
    if value.is_finite() {
        (value * 1000.0).round() / 1000.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_steps_stay_on_the_grid() {
        let mut offsets = SyncOffsets::new();
        for _ in 0..3 {
            offsets.nudge_subtitle(true);
        }
        assert_eq!(offsets.subtitle_offset_secs, 0.3);
        assert!((offsets.subtitle_time(10.0) - 9.7).abs() < 1e-9);

        offsets.reset_subtitle();
        assert_eq!(offsets.subtitle_offset_secs, 0.0);
    }

    #[test]
    fn negative_audio_offset_clamps_delay() {
        let mut offsets = SyncOffsets::new();
        offsets.nudge_audio(false);
        offsets.nudge_audio(false);

        assert_eq!(offsets.audio_offset_secs, -0.2);
        assert_eq!(offsets.audio_delay_secs(), 0.0);

        offsets.adjust_audio(0.45);
        assert_eq!(offsets.audio_delay_secs(), 0.25);
        assert_eq!(offsets.subtitle_offset_secs, 0.0);
    }
}
