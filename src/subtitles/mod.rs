//! Caption tracks parsed from SubRip and WebVTT files.

pub mod parse;
pub mod track;

pub use parse::{parse_srt, parse_vtt, SubtitleError};
pub use track::{Cue, CueTrack, SubtitleCueSource};
