//! Boundary contracts for the media element the engine instruments.

use crate::error::MediaError;

/// Raw decoded audio pulled from a media source.
pub trait AudioTap: Send {
    fn channels(&self) -> u16;

    fn sample_rate(&self) -> u32;

    /// Fill `buf` with interleaved samples and return how many were written.
    /// Zero means the stream has ended.
    fn read(&mut self, buf: &mut [f32]) -> usize;
}

/// Who drives the audible output of the media element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    /// The element plays directly at its own volume and mute state.
    Native { volume: f32, muted: bool },
    /// The element's audio only reaches the speakers through the routing graph.
    Routed,
}

/// A playing media element: readable and controllable position plus an audio tap.
pub trait MediaHandle: Send + Sync {
    /// Stable name used to key persisted records.
    fn filename(&self) -> &str;

    fn position_secs(&self) -> f64;

    fn duration_secs(&self) -> f64;

    fn is_playing(&self) -> bool;

    fn seek(&self, secs: f64);

    /// Open the decoded audio tap. A source can be tapped only once; later calls
    /// fail with `MediaError::AlreadyTapped`.
    fn open_audio_tap(&self) -> Result<Box<dyn AudioTap>, MediaError>;

    fn set_output_mode(&self, mode: OutputMode);

    /// Playback position as a fraction of the duration.
    fn position_fraction(&self) -> f64 {
        let duration = self.duration_secs();
        if duration.is_finite() && duration > 0.0 {
            (self.position_secs() / duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
