use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use super::parse::{parse_srt, parse_vtt, SubtitleError};

/// One caption and the interval `[start, end)` it is shown for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Anything that can answer "which captions are showing at this time".
/// Callers pass a time that already has the subtitle offset applied.
pub trait SubtitleCueSource {
    fn active_cues(&self, time: f64) -> Vec<String>;
}

/// Cues sorted by start time.
#[derive(Debug, Clone, Default)]
pub struct CueTrack {
    cues: Vec<Cue>,
    longest_cue_secs: f64,
}

impl CueTrack {
    pub fn new(mut cues: Vec<Cue>) -> Self {
        cues.sort_by(|a, b| a.start.total_cmp(&b.start));
        let longest_cue_secs = cues
            .iter()
            .map(|cue| cue.end - cue.start)
            .fold(0.0, f64::max);
        Self {
            cues,
            longest_cue_secs,
        }
    }

    /// Load a `.srt` or `.vtt` file.
    pub fn load(path: &Path) -> Result<Self, SubtitleError> {
        let content = fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        let cues = match extension.as_str() {
            "srt" => parse_srt(&content)?,
            "vtt" => parse_vtt(&content)?,
            other => return Err(SubtitleError::UnsupportedFormat(other.to_string())),
        };
        Ok(Self::new(cues))
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn active_at(&self, time: f64) -> Vec<&Cue> {
        let upper = self.cues.partition_point(|cue| cue.start <= time);
        let earliest_start = time - self.longest_cue_secs;

        let mut active: Vec<&Cue> = self.cues[..upper]
            .iter()
            .rev()
            .take_while(|cue| cue.start >= earliest_start)
            .filter(|cue| time < cue.end)
            .collect();
        active.reverse();
        active
    }
}

impl SubtitleCueSource for CueTrack {
    fn active_cues(&self, time: f64) -> Vec<String> {
        self.active_at(time)
            .into_iter()
            .map(|cue| cue.text.clone())
            .collect()
    }
}
